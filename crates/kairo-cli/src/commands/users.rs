use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{format_timestamp_date, now_utc, parse_user_id};
use anyhow::Result;
use clap::Args;
use kairo_core::domain::{parse_date_of_birth, Gender};
use kairo_core::UserProfileDto;
use kairo_store::repo::UserNew;

#[derive(Debug, Args)]
pub struct AddUserArgs {
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date_of_birth: Option<String>,
    /// male, female or other
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long, value_name = "URL")]
    pub picture: Option<String>,
}

#[derive(Debug, Args)]
pub struct RemoveUserArgs {
    pub id: String,
}

pub fn add_user(ctx: &Context<'_>, args: AddUserArgs) -> Result<()> {
    if args.phone.trim().is_empty() {
        return Err(invalid_input("phone cannot be empty"));
    }
    let date_of_birth = args
        .date_of_birth
        .as_deref()
        .map(parse_date_of_birth)
        .transpose()?;
    let gender = args
        .gender
        .as_deref()
        .map(str::parse::<Gender>)
        .transpose()?;
    let profile_picture = args.picture.and_then(normalize_optional_value);

    let user = ctx.store.users().create(
        now_utc(),
        UserNew {
            name: args.name,
            phone_number: args.phone,
            profile_picture,
            date_of_birth,
            gender,
        },
    )?;

    if ctx.json {
        print_json(&UserProfileDto::from(&user))?;
    } else {
        println!("added {} {}", user.id, user.phone_number);
    }
    Ok(())
}

pub fn list_users(ctx: &Context<'_>) -> Result<()> {
    let users = ctx.store.users().list()?;

    if ctx.json {
        let items: Vec<UserProfileDto> = users.iter().map(UserProfileDto::from).collect();
        print_json(&items)?;
        return Ok(());
    }

    for user in users {
        println!(
            "{}  {:<16}  {}  joined {}",
            user.id,
            user.phone_number,
            user.name.as_deref().unwrap_or("-"),
            format_timestamp_date(user.created_at)
        );
    }
    Ok(())
}

pub fn remove_user(ctx: &Context<'_>, args: RemoveUserArgs) -> Result<()> {
    let id = parse_user_id(&args.id)?;
    ctx.store.users().delete(id)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id }))?;
    } else {
        println!("removed {}", id);
    }
    Ok(())
}

fn normalize_optional_value(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
