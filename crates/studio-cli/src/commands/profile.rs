//! Form profile commands.
//!
//! Profiles hold the identity data an agent types into web forms. Sessions
//! start with an empty `default` profile; these commands describe the field
//! layout and print blank templates.
//!
//! # Examples
//!
//! ```bash
//! # List every field, grouped by section
//! studio profile fields
//!
//! # Print an empty profile named "business"
//! studio profile template business
//! ```

use crate::OutputFormat;
use anyhow::{Result, anyhow};
use studio_core::profile::{DEFAULT_PROFILE, FieldSection, Profile, ProfileField};

#[derive(Debug, serde::Serialize)]
struct FieldInfo {
    field: &'static str,
    section: FieldSection,
}

/// List profile fields grouped by section
pub fn fields(format: OutputFormat) -> Result<()> {
    let fields: Vec<FieldInfo> = ProfileField::ALL
        .iter()
        .map(|f| FieldInfo {
            field: f.as_str(),
            section: f.section(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&fields)?),
        OutputFormat::Table => {
            println!("Section,Field");
            for info in &fields {
                println!("{},{}", info.section.label(), info.field);
            }
        }
        OutputFormat::Pretty => {
            let mut current: Option<FieldSection> = None;
            for info in &fields {
                if current != Some(info.section) {
                    if current.is_some() {
                        println!();
                    }
                    println!("{}", console::style(info.section.label()).bold());
                    current = Some(info.section);
                }
                println!("  {}", info.field);
            }
        }
    }

    Ok(())
}

/// Print a profile with every field empty
pub fn template(name: Option<&str>) -> Result<()> {
    let name = name.unwrap_or(DEFAULT_PROFILE).trim();
    if name.is_empty() {
        return Err(anyhow!("Profile name cannot be empty"));
    }

    let profile = Profile::empty(name);
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}
