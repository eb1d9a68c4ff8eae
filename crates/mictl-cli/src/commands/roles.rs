//! User store roles: list, inspect, add and delete.

use std::io::Write;

use serde_json::{Map, Value};

use crate::cli::{GetRolesArgs, RoleArgs};
use crate::client::{AppContext, CliError, CliResult, RequestSpec};
use crate::models::{ListResponse, RoleDetail, RoleSummary};
use crate::output::{FormatSpec, print_detail, print_list, report_domain, write_line};
use crate::response::{ERROR_TAG, decode_json, decode_message};

pub(crate) const ROLES_RESOURCE: &str = "roles";
/// Key holding the outcome of role and user mutations.
pub(crate) const STATUS_TAG: &str = "status";

const ROLE_LIST_FORMAT: &str = "table {{ Role }}";
const ROLE_DETAIL_FORMAT: &str = "detail Role Name - {{ Role }}\n\
Users - {{ Users | join(\", \") }}";
const ROLE_HEADERS: &[(&str, &str)] = &[("Role", "ROLE")];

pub(crate) async fn handle_get_roles(
    ctx: &AppContext,
    args: GetRolesArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let format = args.target.format.as_deref();
    match args.role.as_deref().map(str::trim).filter(|role| !role.is_empty()) {
        None => {
            let url = ctx.management_url(&[ROLES_RESOURCE])?;
            let raw = ctx.execute(&RequestSpec::get(url)).await?;
            let result = decode_json::<ListResponse<RoleSummary>>(&raw, ERROR_TAG)?.into_result();
            if let Some(list) = report_domain(out, "getting the list of roles", result)? {
                let spec = FormatSpec::resolve(format, ROLE_LIST_FORMAT);
                print_list(out, &list.list, &spec, ROLE_HEADERS, "No roles found")?;
            }
        }
        Some(role) => {
            let url = ctx.management_url(&[ROLES_RESOURCE, role])?;
            let request = RequestSpec::get(url).query_opt("domain", args.domain.as_deref());
            let raw = ctx.execute(&request).await?;
            let result = decode_json::<RoleDetail>(&raw, ERROR_TAG)?.into_result();
            let context = format!("getting information of role [ {role} ]");
            if let Some(detail) = report_domain(out, &context, result)? {
                let spec = FormatSpec::resolve_detail(format, ROLE_DETAIL_FORMAT);
                print_detail(out, &detail, &spec)?;
            }
        }
    }
    Ok(())
}

pub(crate) async fn handle_add_role(
    ctx: &AppContext,
    args: RoleArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let role = required_role(&args.role)?;
    let mut body = Map::new();
    body.insert("role".to_string(), Value::from(role));
    if let Some(domain) = args.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        body.insert("domain".to_string(), Value::from(domain));
    }

    let url = ctx.management_url(&[ROLES_RESOURCE])?;
    let raw = ctx
        .execute(&RequestSpec::post(url, Value::Object(body)))
        .await?;
    let result = decode_message(&raw, STATUS_TAG, ERROR_TAG)?.into_result();
    let context = format!("adding role [ {role} ]");
    if let Some(status) = report_domain(out, &context, result)? {
        write_line(out, &format!("Adding role [ {role} ] status: {status}"))?;
    }
    Ok(())
}

pub(crate) async fn handle_delete_role(
    ctx: &AppContext,
    args: RoleArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let role = required_role(&args.role)?;
    let url = ctx.management_url(&[ROLES_RESOURCE, role])?;
    let request = RequestSpec::delete(url).query_opt("domain", args.domain.as_deref());
    let raw = ctx.execute(&request).await?;
    let result = decode_message(&raw, STATUS_TAG, ERROR_TAG)?.into_result();
    let context = format!("deleting role [ {role} ]");
    if let Some(status) = report_domain(out, &context, result)? {
        write_line(out, &format!("Deleting role [ {role} ] status: {status}"))?;
    }
    Ok(())
}

fn required_role(role: &str) -> CliResult<&str> {
    let trimmed = role.trim();
    if trimmed.is_empty() {
        Err(CliError::validation("role name cannot be empty"))
    } else {
        Ok(trimmed)
    }
}
