use std::io::{self, Write};

use crate::core::config::Configuration;

/// Print every endpoint with its models. The model used for chat titles is
/// marked with `*`.
pub fn list_endpoints(config: &Configuration, out: &mut impl Write) -> io::Result<()> {
    if config.endpoints.is_empty() {
        writeln!(
            out,
            "No endpoints configured. Add one with 'sparkle endpoint add'."
        )?;
        return Ok(());
    }

    let title_model_id = config.default_title_model().map(|(_, model)| model.id.as_str());

    writeln!(out, "Configured Endpoints:")?;
    for endpoint in &config.endpoints {
        writeln!(out)?;
        writeln!(out, "{} <{}>", endpoint.name, endpoint.base_url)?;
        writeln!(out, "  id: {}", endpoint.id)?;

        if endpoint.models.is_empty() {
            writeln!(out, "  (no models)")?;
            continue;
        }
        for model in &endpoint.models {
            let marker = if title_model_id == Some(model.id.as_str()) {
                "*"
            } else {
                " "
            };
            let mode = if model.supports_streaming {
                "streaming"
            } else {
                "buffered"
            };
            writeln!(
                out,
                "  {marker} {} [{}] {mode}, api-version {}",
                model.name, model.deployment_name, model.api_version
            )?;
            writeln!(out, "      id: {}", model.id)?;
        }
    }

    if title_model_id.is_some() {
        writeln!(out)?;
        writeln!(out, "* = used for chat titles")?;
    }
    Ok(())
}
