//! User store users: list, inspect, add, update roles and delete.

use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use serde_json::{Map, Value};

use crate::cli::{AddUserArgs, GetUsersArgs, UpdateUserArgs, UserIdArgs};
use crate::client::{AppContext, CliError, CliResult, RequestSpec};
use crate::commands::roles::{ROLES_RESOURCE, STATUS_TAG};
use crate::models::{ListResponse, UserDetail, UserSummary};
use crate::output::{FormatSpec, print_detail, print_list, report_domain, write_line};
use crate::response::{ERROR_TAG, decode_json, decode_message};

const USERS_RESOURCE: &str = "users";
const USER_LIST_FORMAT: &str = "table {{ UserId }}";
const USER_DETAIL_FORMAT: &str = "detail Name - {{ UserId }}\n\
Is Admin - {{ IsAdmin }}\n\
Roles - {{ Roles | join(\", \") }}";
const USER_HEADERS: &[(&str, &str)] = &[("UserId", "USER ID")];

/// List users filtered by role or pattern, or show one user.
pub(crate) async fn handle_get_users(
    ctx: &AppContext,
    args: GetUsersArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let format = args.target.format.as_deref();
    match args.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        None => {
            let url = ctx.management_url(&[USERS_RESOURCE])?;
            let request = RequestSpec::get(url)
                .query_opt("role", args.role.as_deref())
                .query_opt("pattern", args.pattern.as_deref());
            let raw = ctx.execute(&request).await?;
            let result = decode_json::<ListResponse<UserSummary>>(&raw, ERROR_TAG)?.into_result();
            if let Some(list) = report_domain(out, "getting the list of users", result)? {
                let spec = FormatSpec::resolve(format, USER_LIST_FORMAT);
                print_list(out, &list.list, &spec, USER_HEADERS, "No Users found")?;
            }
        }
        Some(user_id) => {
            let url = ctx.management_url(&[USERS_RESOURCE, user_id])?;
            let request = RequestSpec::get(url).query_opt("domain", args.domain.as_deref());
            let raw = ctx.execute(&request).await?;
            let result = decode_json::<UserDetail>(&raw, ERROR_TAG)?.into_result();
            let context = format!("getting information of user [ {user_id} ]");
            if let Some(detail) = report_domain(out, &context, result)? {
                let spec = FormatSpec::resolve_detail(format, USER_DETAIL_FORMAT);
                print_detail(out, &detail, &spec)?;
            }
        }
    }
    Ok(())
}

pub(crate) async fn handle_add_user(
    ctx: &AppContext,
    args: AddUserArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let user_id = required_user(&args.user_id)?;
    let password = resolve_new_password(args.password.as_deref())?;

    let mut body = Map::new();
    body.insert("userId".to_string(), Value::from(user_id));
    body.insert("password".to_string(), Value::from(password));
    body.insert(
        "isAdmin".to_string(),
        Value::from(if args.admin { "true" } else { "false" }),
    );
    insert_domain(&mut body, args.domain.as_deref());

    let url = ctx.management_url(&[USERS_RESOURCE])?;
    let raw = ctx
        .execute(&RequestSpec::post(url, Value::Object(body)))
        .await?;
    let result = decode_message(&raw, STATUS_TAG, ERROR_TAG)?.into_result();
    let context = format!("adding user [ {user_id} ]");
    if let Some(status) = report_domain(out, &context, result)? {
        write_line(out, &format!("Adding user [ {user_id} ] status: {status}"))?;
    }
    Ok(())
}

/// Assign and revoke roles of a user in one request.
pub(crate) async fn handle_update_user(
    ctx: &AppContext,
    args: UpdateUserArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let user_id = required_user(&args.user_id)?;
    let added = clean_roles(&args.added_roles);
    let removed = clean_roles(&args.removed_roles);
    if added.is_empty() && removed.is_empty() {
        return Err(CliError::validation(
            "nothing to update; pass --add-role or --remove-role",
        ));
    }

    let mut body = Map::new();
    body.insert("userId".to_string(), Value::from(user_id));
    body.insert("removedRoles".to_string(), Value::from(removed));
    body.insert("addedRoles".to_string(), Value::from(added));
    insert_domain(&mut body, args.domain.as_deref());

    let url = ctx.management_url(&[ROLES_RESOURCE])?;
    let raw = ctx
        .execute(&RequestSpec::put(url, Value::Object(body)))
        .await?;
    let result = decode_message(&raw, STATUS_TAG, ERROR_TAG)?.into_result();
    let context = format!("updating user [ {user_id} ]");
    if let Some(status) = report_domain(out, &context, result)? {
        write_line(out, &format!("Updating user [ {user_id} ] status: {status}"))?;
    }
    Ok(())
}

pub(crate) async fn handle_delete_user(
    ctx: &AppContext,
    args: UserIdArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let user_id = required_user(&args.user_id)?;
    let url = ctx.management_url(&[USERS_RESOURCE, user_id])?;
    let request = RequestSpec::delete(url).query_opt("domain", args.domain.as_deref());
    let raw = ctx.execute(&request).await?;
    let result = decode_message(&raw, STATUS_TAG, ERROR_TAG)?.into_result();
    let context = format!("deleting user [ {user_id} ]");
    if let Some(status) = report_domain(out, &context, result)? {
        write_line(out, &format!("Deleting user [ {user_id} ] status: {status}"))?;
    }
    Ok(())
}

fn required_user(user_id: &str) -> CliResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err(CliError::validation("user id cannot be empty"))
    } else {
        Ok(trimmed)
    }
}

fn clean_roles(roles: &[String]) -> Vec<String> {
    roles
        .iter()
        .map(|role| role.trim())
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}

fn insert_domain(body: &mut Map<String, Value>, domain: Option<&str>) {
    if let Some(domain) = domain.map(str::trim).filter(|domain| !domain.is_empty()) {
        body.insert("domain".to_string(), Value::from(domain));
    }
}

/// Password for a new user: the flag value, or two matching prompts.
fn resolve_new_password(given: Option<&str>) -> CliResult<String> {
    if let Some(value) = given {
        if value.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        return Ok(value.to_string());
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "password required; supply via --password when running non-interactively",
        ));
    }

    let prompt = |label: &str| {
        rpassword::prompt_password(label).map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })
    };
    let first = prompt("Enter password for new user: ")?;
    let second = prompt("Re-enter password: ")?;
    confirm_password(first, &second)
}

fn confirm_password(first: String, second: &str) -> CliResult<String> {
    if first != second {
        return Err(CliError::validation("Passwords are not matching."));
    }
    if first.is_empty() {
        return Err(CliError::validation("password cannot be empty"));
    }
    Ok(first)
}
