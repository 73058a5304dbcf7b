use remedy_core::action::normalize;
use remedy_core::RemedyError;

use crate::output::print_json;

pub fn run(raw: &str, json: bool) -> anyhow::Result<()> {
    let action = normalize(raw).ok_or_else(|| RemedyError::UnsupportedAction(raw.to_string()))?;

    if json {
        print_json(&serde_json::json!({
            "input": raw,
            "action": action.as_str(),
            "route": action.route().as_str(),
            "requires": action.required_field().map(|f| format!("target.{}", f.as_str())),
            "requires_approval": action.requires_approval(),
        }))?;
    } else {
        println!("{action}");
    }
    Ok(())
}
