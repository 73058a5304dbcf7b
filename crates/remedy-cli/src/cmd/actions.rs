use remedy_core::action::{CanonicalAction, ALIASES};

use crate::output::{print_json, print_table};

fn aliases_of(action: CanonicalAction) -> Vec<&'static str> {
    ALIASES
        .iter()
        .filter(|(_, a)| *a == action)
        .map(|(alias, _)| *alias)
        .collect()
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let actions = CanonicalAction::all();

    if json {
        let rows: Vec<serde_json::Value> = actions
            .iter()
            .map(|&a| {
                serde_json::json!({
                    "action": a.as_str(),
                    "route": a.route().as_str(),
                    "requires": a.required_field().map(|f| format!("target.{}", f.as_str())),
                    "aliases": aliases_of(a),
                })
            })
            .collect();
        return print_json(&rows);
    }

    let rows = actions
        .iter()
        .map(|&a| {
            vec![
                a.as_str().to_string(),
                a.route().as_str().to_string(),
                a.required_field()
                    .map(|f| format!("target.{}", f.as_str()))
                    .unwrap_or_else(|| "-".to_string()),
                aliases_of(a).join(", "),
            ]
        })
        .collect();
    print_table(&["ACTION", "ROUTE", "REQUIRES", "ALIASES"], rows);
    Ok(())
}
