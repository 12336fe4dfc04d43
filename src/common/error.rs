use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid configuration for {subject}: {reason}")]
    Configuration { subject: String, reason: String },

    #[error("Impossible to place {entity} in the arena after {attempts} attempts")]
    PlacementExhausted { entity: String, attempts: usize },

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
}

impl DomainError {
    pub fn configuration(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Configuration {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Stage {stage} failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error("Stage {stage} terminated abnormally")]
    StagePanicked { stage: String },

    #[error("Stage {stage} lost its {channel} channel")]
    ChannelClosed { stage: String, channel: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

impl ApplicationError {
    pub fn channel_closed(stage: &str, channel: &str) -> Self {
        ApplicationError::ChannelClosed {
            stage: stage.to_string(),
            channel: channel.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(error: &DomainError) -> &str {
        match error {
            DomainError::Configuration { subject, .. } => subject,
            DomainError::PlacementExhausted { entity, .. } => entity,
            DomainError::InvalidState { .. } => "",
        }
    }

    #[test]
    fn test_domain_errors_name_their_subject() {
        let config = DomainError::configuration("agents.a", "bad shape");
        assert_eq!(subject(&config), "agents.a");
        assert_eq!(config.to_string(), "Invalid configuration for agents.a: bad shape");

        let placement = DomainError::PlacementExhausted {
            entity: "agent_a_3".to_string(),
            attempts: 500,
        };
        assert_eq!(subject(&placement), "agent_a_3");
        assert!(placement.to_string().contains("500 attempts"));
    }
}
