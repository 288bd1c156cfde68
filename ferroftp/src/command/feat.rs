use crate::capability::CapabilitySet;
use crate::log_sink::SharedLogSink;
use crate::types::Reply;

/// Parses the reply to `FEAT` into the server capabilities.
///
/// RFC is specified [RFC 2389](https://datatracker.ietf.org/doc/html/rfc2389#section-3.2).
///
/// This is the syntax of the FEAT response:
///
/// - no-features: "211 [SP] ..."
/// - features-list: "211-...":
///     - ... "feature-label" [[SP] ["description"]]
///     - "211 END"
///
/// The first info line is the `211-` header. Feature lines should start with a space,
/// but some servers don't indent them, so they're accepted anyway.
pub fn parse_features(reply: &Reply, log: &SharedLogSink) -> CapabilitySet {
    let mut capabilities = CapabilitySet::default();
    let Some(header) = reply.info().first() else {
        log.debug("Found `211` - no features available");
        return capabilities;
    };
    log.debug(format!("Parsing features; header: {header}"));
    for line in reply.info().iter().skip(1) {
        if !line.starts_with(' ') {
            log.warn(format!("Feature line {line:?} doesn't start with ` `"));
        }
        log.trace(format!("found supported feature: {}", line.trim()));
        capabilities.add_feature_line(line);
    }
    capabilities
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use log::Level;

    use super::*;
    use crate::capability::Capability;
    use crate::log_sink::test::MemorySink;

    #[test]
    fn test_should_parse_no_features() {
        let reply = Reply::new(211, "No features available");
        let features = parse_features(&reply, &SharedLogSink::default());
        assert!(features.is_empty());
    }

    #[test]
    fn test_should_parse_features() {
        let reply = Reply::new(211, "END").with_info(vec![
            "Features:".to_string(),
            " MLST size*;create;modify*;perm;media-type".to_string(),
            " SIZE".to_string(),
            " COMPRESSION".to_string(),
        ]);
        let capabilities = parse_features(&reply, &SharedLogSink::default());
        let features = capabilities.features();
        assert_eq!(features.len(), 3);
        assert_eq!(
            features
                .get("MLST")
                .as_ref()
                .expect("no MLST")
                .as_deref()
                .expect("no value for MLST"),
            "size*;create;modify*;perm;media-type"
        );
        assert_eq!(features.get("SIZE"), Some(&None));
        assert_eq!(features.get("COMPRESSION"), Some(&None));
        assert!(capabilities.has(Capability::Mlsd));
        assert!(capabilities.has(Capability::Size));
    }

    #[test]
    fn test_should_warn_about_unindented_features() {
        let sink = MemorySink::default();
        let reply = Reply::new(211, "End")
            .with_info(vec!["Extensions supported:".to_string(), "UTF8".to_string()]);
        parse_features(&reply, &SharedLogSink::new(sink.clone()));
        assert!(sink
            .lines()
            .contains(&(Level::Warn, "Feature line \"UTF8\" doesn't start with ` `".to_string())));
    }

    #[test]
    fn test_should_accept_unindented_features() {
        let reply = Reply::new(211, "End").with_info(vec![
            "Extensions supported:".to_string(),
            "UTF8".to_string(),
            "".to_string(),
            " REST STREAM".to_string(),
        ]);
        let capabilities = parse_features(&reply, &SharedLogSink::default());
        assert_eq!(capabilities.features().len(), 2);
        assert!(capabilities.has(Capability::Utf8));
        assert!(capabilities.has(Capability::RestStream));
    }
}
