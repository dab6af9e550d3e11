use anyhow::Result;
use courier_config::KafkaConfig;
use rdkafka::config::ClientConfig;
use tracing::info;

/// Build the `ClientConfig` shared by the producer and the consumer.
///
/// Handles bootstrap servers, SSL/TLS (optionally with a custom CA) and SASL
/// authentication when a mechanism, username and password are all present.
pub fn create_client_config(config: &KafkaConfig) -> Result<ClientConfig> {
    if config.brokers.trim().is_empty() {
        anyhow::bail!("KAFKA_BROKERS must not be empty");
    }

    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.brokers);
    client_config.set("security.protocol", "plaintext");

    if config.ssl_enabled {
        info!("Enabling SSL/TLS for Kafka connection");
        client_config.set("security.protocol", "ssl");

        if let Some(ca_location) = &config.ssl_ca_location {
            client_config.set("ssl.ca.location", ca_location);
        }
    }

    if let (Some(mechanism), Some(username), Some(password)) = (
        &config.sasl_mechanism,
        &config.sasl_username,
        &config.sasl_password,
    ) {
        info!(sasl_mechanism = %mechanism, "Configuring SASL authentication");
        client_config
            .set("sasl.mechanism", mechanism)
            .set("sasl.username", username)
            .set("sasl.password", password);

        if config.ssl_enabled {
            client_config.set("security.protocol", "sasl_ssl");
        } else {
            client_config.set("security.protocol", "sasl_plaintext");
        }
    }

    Ok(client_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_by_default() {
        let client_config = create_client_config(&KafkaConfig::default()).unwrap();
        assert_eq!(client_config.get("security.protocol"), Some("plaintext"));
        assert_eq!(client_config.get("bootstrap.servers"), Some("localhost:9092"));
    }

    #[test]
    fn test_sasl_over_ssl() {
        let config = KafkaConfig {
            ssl_enabled: true,
            ssl_ca_location: Some("/etc/ssl/ca.pem".to_string()),
            sasl_mechanism: Some("SCRAM-SHA-256".to_string()),
            sasl_username: Some("courier".to_string()),
            sasl_password: Some("secret".to_string()),
            ..KafkaConfig::default()
        };

        let client_config = create_client_config(&config).unwrap();
        assert_eq!(client_config.get("security.protocol"), Some("sasl_ssl"));
        assert_eq!(client_config.get("sasl.mechanism"), Some("SCRAM-SHA-256"));
        assert_eq!(client_config.get("ssl.ca.location"), Some("/etc/ssl/ca.pem"));
    }

    #[test]
    fn test_partial_sasl_credentials_are_ignored() {
        let config = KafkaConfig {
            sasl_mechanism: Some("PLAIN".to_string()),
            sasl_username: Some("courier".to_string()),
            ..KafkaConfig::default()
        };

        let client_config = create_client_config(&config).unwrap();
        assert_eq!(client_config.get("security.protocol"), Some("plaintext"));
        assert_eq!(client_config.get("sasl.mechanism"), None);
    }

    #[test]
    fn test_empty_brokers_rejected() {
        let config = KafkaConfig {
            brokers: " ".to_string(),
            ..KafkaConfig::default()
        };
        assert!(create_client_config(&config).is_err());
    }
}
