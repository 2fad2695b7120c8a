use std::{sync::Arc, time::Duration};

use axum::Router;
use eventlink_core::config::{AppConfig, ConfigError};
use eventlink_slack::{
    api::{HttpSlackApi, SlackApiError},
    events::{default_dispatcher, EventDispatcher},
    signature::SignatureVerifier,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{health, webhook};

pub struct Application {
    pub config: AppConfig,
    pub dispatcher: Arc<EventDispatcher>,
    pub verifier: Option<Arc<SignatureVerifier>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack client setup failed: {0}")]
    SlackClient(#[source] SlackApiError),
}

impl Application {
    pub fn router(&self) -> Router {
        webhook::router(webhook::WebhookState {
            dispatcher: self.dispatcher.clone(),
            verifier: self.verifier.clone(),
        })
        .merge(health::router(self.verifier.is_some()))
    }
}

pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let api = HttpSlackApi::new(
        &config.slack.api_base_url,
        config.slack.bot_token.clone(),
        Duration::from_secs(config.slack.request_timeout_secs),
    )
    .map_err(BootstrapError::SlackClient)?;
    let dispatcher = default_dispatcher(Arc::new(api), &config);
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        handler_count = dispatcher.handler_count(),
        "slack event dispatcher initialized"
    );

    let verifier = if config.slack.verify_signatures {
        Some(Arc::new(SignatureVerifier::new(config.slack.signing_secret.clone())))
    } else {
        warn!(
            event_name = "system.bootstrap.signatures_disabled",
            correlation_id = "bootstrap",
            "slack request signature verification is disabled"
        );
        None
    };

    Ok(Application { config, dispatcher: Arc::new(dispatcher), verifier })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use eventlink_core::config::AppConfig;
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.slack.bot_token = "xoxb-test".to_owned().into();
        config.slack.signing_secret = "secret".to_owned().into();
        config
    }

    #[test]
    fn bootstrap_fails_fast_without_bot_token() {
        let result = bootstrap(AppConfig::default());

        let Err(BootstrapError::Config(error)) = result else {
            panic!("expected config error");
        };
        assert!(error.to_string().contains("slack.bot_token"));
    }

    #[test]
    fn bootstrap_wires_both_handlers_and_verifier() {
        let app = bootstrap(valid_config()).expect("bootstrap should succeed");

        assert_eq!(app.dispatcher.handler_count(), 2);
        assert!(app.verifier.is_some());
    }

    #[test]
    fn disabling_signatures_skips_verifier() {
        let mut config = valid_config();
        config.slack.verify_signatures = false;
        config.slack.signing_secret = String::new().into();

        let app = bootstrap(config).expect("bootstrap should succeed");

        assert!(app.verifier.is_none());
    }

    #[tokio::test]
    async fn router_serves_health_and_guards_webhook() {
        let app = bootstrap(valid_config()).expect("bootstrap should succeed");

        let health = app
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let unsigned = app
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/slack/events")
                    .body(Body::from(r#"{"type":"url_verification","challenge":"x"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);
    }
}
