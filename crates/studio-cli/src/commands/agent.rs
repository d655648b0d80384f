use crate::OutputFormat;
use anyhow::Result;
use studio_core::agent::AgentKind;

#[derive(Debug, serde::Serialize)]
struct KindInfo {
    kind: &'static str,
    label: &'static str,
}

/// List the kinds an agent can be created with
pub fn kinds(format: OutputFormat) -> Result<()> {
    let kinds: Vec<KindInfo> = AgentKind::ALL
        .iter()
        .map(|k| KindInfo {
            kind: k.as_str(),
            label: k.label(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&kinds)?),
        OutputFormat::Table => {
            println!("Kind,Label");
            for info in &kinds {
                println!("{},{}", info.kind, info.label);
            }
        }
        OutputFormat::Pretty => {
            println!("Agent kinds:");
            println!();
            for info in &kinds {
                let marker = if info.kind == AgentKind::default().as_str() {
                    "* "
                } else {
                    "  "
                };
                println!("{}{:<20} {}", marker, info.kind, info.label);
            }
        }
    }

    Ok(())
}
