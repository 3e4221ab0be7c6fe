use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// The structured failure object written to stderr for any command error.
pub fn error_json(err: &anyhow::Error) -> serde_json::Value {
    let kind = err
        .downcast_ref::<devskills_core::SkillError>()
        .map(devskills_core::SkillError::kind)
        .unwrap_or("unexpected");
    serde_json::json!({
        "success": false,
        "error": format!("{err:#}"),
        "kind": kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devskills_core::SkillError;

    #[test]
    fn error_json_carries_core_kind() {
        let err = anyhow::Error::from(SkillError::ModuleExists("filter".into()));
        let json = error_json(&err);
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "duplicate_module");
        assert_eq!(json["error"], "module 'filter' already exists in manifest");
    }

    #[test]
    fn error_json_sees_through_context() {
        let err = anyhow::Error::from(SkillError::NotFound("x.json".into()))
            .context("loading manifest");
        assert_eq!(error_json(&err)["kind"], "not_found");
    }

    #[test]
    fn error_json_reports_usage_errors() {
        let err = anyhow::Error::from(SkillError::Usage("nothing to do".into()));
        let json = error_json(&err);
        assert_eq!(json["kind"], "usage");
        assert_eq!(json["error"], "usage: nothing to do");
    }

    #[test]
    fn error_json_defaults_to_unexpected() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(error_json(&err)["kind"], "unexpected");
    }
}
