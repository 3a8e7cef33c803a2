use clap::Subcommand;
use serde_json::Value;

use crate::auth::{Identity, TokenCodec, TokenError};
use crate::cli::utils::{fail, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a credential signed with JWT_SECRET")]
    Issue {
        #[arg(long, help = "User id claim")]
        id: i64,
        #[arg(long, help = "Username claim")]
        username: String,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, default_value = "user", help = "Role claim (admin grants delete)")]
        role: String,
        #[arg(long, help = "Lifetime in seconds (defaults to JWT_EXPIRATION)")]
        ttl: Option<i64>,
    },

    #[command(about = "Check signature and expiry of a credential")]
    Verify {
        #[arg(help = "Credential to check")]
        token: String,
    },

    #[command(about = "Show a credential's claims without checking it")]
    Decode {
        #[arg(help = "Credential to inspect")]
        token: String,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { id, username, email, role, ttl } => {
            let codec = codec_from_env()?;
            let identity = Identity { id, username, email, role };
            let token = codec.issue_with_ttl(identity.to_claims(), ttl.unwrap_or(codec.ttl_seconds()))?;
            output_success(&output_format, "Credential issued", Some(Value::String(token)))
        }
        TokenCommands::Verify { token } => {
            let codec = codec_from_env()?;
            match codec.verify(&token) {
                Ok(claims) => output_success(&output_format, "Credential is valid", Some(Value::Object(claims))),
                Err(e) => Err(fail(&output_format, &e.to_string(), Some(error_code(&e)))),
            }
        }
        TokenCommands::Decode { token } => match TokenCodec::decode(&token) {
            Some(claims) => output_success(
                &output_format,
                "Claims (signature and expiry NOT checked)",
                Some(Value::Object(claims)),
            ),
            None => Err(fail(&output_format, "token payload is not readable", Some("MALFORMED_TOKEN"))),
        },
    }
}

fn codec_from_env() -> anyhow::Result<TokenCodec> {
    let config = AppConfig::from_env();
    config.validate()?;
    Ok(TokenCodec::new(
        config.security.jwt_secret.as_bytes(),
        config.security.jwt_expiration_secs,
    ))
}

fn error_code(err: &TokenError) -> &'static str {
    match err {
        TokenError::MalformedToken => "MALFORMED_TOKEN",
        TokenError::BadSignature => "BAD_SIGNATURE",
        TokenError::Expired => "EXPIRED",
        TokenError::InvalidSecret => "INVALID_SECRET",
        TokenError::Encoding(_) => "ENCODING_FAILED",
    }
}
