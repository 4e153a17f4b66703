//! Access-checked invocation of registered tools.

use std::fmt;
use std::sync::Arc;

use toolforge_policy::{AccessDecision, AccessPolicy};
use toolforge_primitives::{FieldMap, Identity};
use toolforge_tools::{PluginRegistry, guarded, output};
use tracing::{debug, error, warn};

use crate::error::{DispatchError, DispatchResult};

/// Routes calls by tool name after an access check.
///
/// Tool failures never escape as errors. A tool that returns an error or
/// panics yields a failure output with a generic message, and the detail is
/// only logged.
#[derive(Clone)]
pub struct DispatchService {
    registry: Arc<PluginRegistry>,
    policy: Arc<dyn AccessPolicy>,
}

impl DispatchService {
    /// Creates a dispatcher over `registry`, checking calls with `policy`.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { registry, policy }
    }

    /// Returns the registry calls are routed through.
    #[must_use]
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Returns the access policy in force.
    #[must_use]
    pub fn policy(&self) -> &Arc<dyn AccessPolicy> {
        &self.policy
    }

    /// Invokes the tool registered under `name` on behalf of `identity`.
    ///
    /// The entry is resolved once and held for the whole call, so a
    /// concurrent unload or replacement neither affects the call nor releases
    /// its isolation context early.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] when no tool has that name and
    /// [`DispatchError::AccessDenied`] when the caller's tier falls short of
    /// the tool's required level.
    pub fn process(
        &self,
        name: &str,
        identity: Option<&Identity>,
        input: FieldMap,
    ) -> DispatchResult<FieldMap> {
        let Some(entry) = self.registry.entry(name) else {
            debug!(tool = name, "dispatch to unknown tool");
            return Err(DispatchError::NotFound { name: name.into() });
        };

        let descriptor = entry.descriptor();
        let tier = self.policy.tier_of(identity);
        let required = self.policy.required_level_of(descriptor.as_deref());
        if let AccessDecision::Deny { tier, required } = self.policy.decide(tier, required) {
            warn!(
                tool = name,
                subject = identity.map(Identity::subject),
                %tier,
                %required,
                "tool access denied"
            );
            return Err(DispatchError::AccessDenied { tier, required });
        }

        debug!(
            tool = name,
            subject = identity.map(Identity::subject),
            %tier,
            %required,
            context = %entry.context_id(),
            "dispatching tool call"
        );

        match guarded(|| entry.instance().process(input)) {
            Ok(output) => Ok(output),
            Err(err) => {
                error!(tool = name, error = %err, "tool failed to process request");
                Ok(output::failure(format!(
                    "tool `{name}` failed to process the request"
                )))
            }
        }
    }
}

impl fmt::Debug for DispatchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchService")
            .field("tools", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use serde_json::json;
    use toolforge_policy::TierPolicy;
    use toolforge_primitives::{AccessLevel, Tier, ToolDescriptor, ToolName};
    use toolforge_tools::{IsolationContext, Tool, ToolError, ToolResult};

    enum Behavior {
        Echo,
        Fail,
        Panic,
    }

    struct Fixture {
        name: &'static str,
        level: Option<AccessLevel>,
        behavior: Behavior,
    }

    impl Tool for Fixture {
        fn name(&self) -> &str {
            self.name
        }

        fn metadata(&self) -> ToolResult<ToolDescriptor> {
            match self.level {
                Some(level) => ToolDescriptor::builder(self.name)
                    .access_level(level)
                    .build()
                    .map_err(|err| ToolError::invalid_metadata(err.to_string())),
                None => Err(ToolError::invalid_metadata("metadata unavailable")),
            }
        }

        fn process(&self, input: FieldMap) -> ToolResult<FieldMap> {
            match self.behavior {
                Behavior::Echo => Ok(output::success(input)),
                Behavior::Fail => Err(ToolError::execution("secret backend detail")),
                Behavior::Panic => panic!("tool exploded"),
            }
        }
    }

    fn service(tools: Vec<Fixture>) -> DispatchService {
        let registry = Arc::new(PluginRegistry::new());
        let context =
            IsolationContext::builder("fixtures", PathBuf::from("fixtures.tpk"), FieldMap::new())
                .build();
        for tool in tools {
            let name = ToolName::new(tool.name).unwrap();
            registry.put(name, Arc::new(tool), Arc::clone(&context));
        }
        DispatchService::new(registry, Arc::new(TierPolicy::default()))
    }

    fn input() -> FieldMap {
        let mut input = FieldMap::new();
        input.insert("value".into(), json!(42));
        input
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let service = service(Vec::new());
        let err = service.process("ghost", None, FieldMap::new()).unwrap_err();
        assert_eq!(err, DispatchError::NotFound { name: "ghost".into() });
    }

    #[test]
    fn admin_tool_denies_lower_tiers() {
        let service = service(vec![Fixture {
            name: "purge",
            level: Some(AccessLevel::Admin),
            behavior: Behavior::Echo,
        }]);

        let err = service.process("purge", None, input()).unwrap_err();
        assert_eq!(
            err,
            DispatchError::AccessDenied {
                tier: Tier::Anonymous,
                required: AccessLevel::Admin
            }
        );

        let premium = Identity::new("p").with_role("premium");
        assert_eq!(
            service.process("purge", Some(&premium), input()).unwrap_err().status_code(),
            403
        );

        let admin = Identity::new("root").with_role("admin");
        let output = service.process("purge", Some(&admin), input()).unwrap();
        assert_eq!(output["value"], json!(42));
        assert!(output::is_success(&output));
    }

    #[test]
    fn missing_descriptor_falls_back_to_normal() {
        let service = service(vec![Fixture {
            name: "flaky",
            level: None,
            behavior: Behavior::Echo,
        }]);

        let caller = Identity::new("u").with_role("viewer");
        assert!(service.process("flaky", Some(&caller), input()).is_ok());
        assert!(service.process("flaky", None, input()).is_ok());
    }

    #[test]
    fn tool_errors_become_generic_failures() {
        let service = service(vec![Fixture {
            name: "broken",
            level: Some(AccessLevel::Normal),
            behavior: Behavior::Fail,
        }]);

        let output = service.process("broken", None, input()).unwrap();
        assert!(!output::is_success(&output));
        let message = output::error_message(&output).unwrap();
        assert_eq!(message, "tool `broken` failed to process the request");
        assert!(!message.contains("secret"));
    }

    #[test]
    fn tool_panics_become_failures() {
        let service = service(vec![Fixture {
            name: "boom",
            level: Some(AccessLevel::Normal),
            behavior: Behavior::Panic,
        }]);

        let output = service.process("boom", None, input()).unwrap();
        assert_eq!(output["success"], json!(false));
        assert_eq!(
            output::error_message(&output),
            Some("tool `boom` failed to process the request")
        );
    }
}
