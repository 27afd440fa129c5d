use serde::Deserialize;

/// A credential for an external service. Can be written inline or as `$ENV_VAR`
/// in the config, and is never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiSecret(String);

impl ApiSecret {
    /// Returns true when no value was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiSecret").field(&"**********").finish()
    }
}

impl From<String> for ApiSecret {
    fn from(secret: String) -> Self {
        ApiSecret(secret)
    }
}

impl std::ops::Deref for ApiSecret {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ApiSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ApiSecretVisitor;
        impl<'de> serde::de::Visitor<'de> for ApiSecretVisitor {
            type Value = String;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str(
                    "api secret or an env var containing an api secret in it",
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                crate::resolve_env_value(value)
            }
        }

        let secret = deserializer.deserialize_str(ApiSecretVisitor)?;
        Ok(Self(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let secret: ApiSecret = serde_json::from_str("\"hunter2\"").unwrap();
        assert_eq!(secret.as_str(), "hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn missing_env_var_is_an_error() {
        let res: Result<ApiSecret, _> =
            serde_json::from_str("\"$GOV_RELAYER_SURELY_UNSET_VAR\"");
        assert!(res.is_err());
    }
}
