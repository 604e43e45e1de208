use anyhow::{Context, Result};
use serde::Serialize;

const TEMPLATE: &str = include_str!("autologin.js");
const PLACEHOLDER: &str = "__ILOVIEWER_CONFIG__";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptConfig<'a> {
    login: &'a str,
    password: &'a str,
    disc_options: &'a [String],
}

/// Page initialization script with the credentials and disc options baked in.
///
/// All values go in as a single JSON object literal, so nothing supplied on the command
/// line can break out of it.
pub fn build_init_script(login: &str, password: &str, disc_options: &[String]) -> Result<String> {
    let cfg = serde_json::to_string(&ScriptConfig {
        login,
        password,
        disc_options,
    })
    .context("failed to encode init script parameters")?;
    Ok(TEMPLATE.replacen(PLACEHOLDER, &cfg, 1))
}
