//! Demo service: a handful of procedures covering sync, async, defaults and
//! structured results

mod types;

pub use types::{Status, User};

use std::time::Duration;

use crate::rpc::errors::RegistrationError;
use crate::rpc::procedure::Procedure;
use crate::rpc::registry::Registry;

/// Declare every demo procedure into `registry`
pub fn register(registry: &Registry) -> Result<(), RegistrationError> {
    registry.declare(
        Procedure::builder("add")
            .doc("Add two integers.")
            .param("a")
            .param_default("b", 0)
            .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })?,
    )?;

    registry.declare(
        Procedure::builder("greet")
            .doc("Return a greeting for `name`.")
            .param_default("name", "World")
            .sync(|name: String| -> anyhow::Result<String> { Ok(format!("Hello, {}!", name)) })?,
    )?;

    registry.declare(
        Procedure::builder("get_status")
            .doc("Report server status.")
            .asynchronous(|| async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok::<_, anyhow::Error>(Status {
                    status: "ok".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                })
            })?,
    )?;

    registry.declare(
        Procedure::builder("get_user")
            .doc("Look up a user by id.")
            .param("user_id")
            .sync(|user_id: i64| -> anyhow::Result<User> {
                if user_id <= 0 {
                    anyhow::bail!("User {} not found", user_id);
                }
                Ok(User {
                    id: user_id,
                    name: format!("User {}", user_id),
                    email: format!("user{}@example.com", user_id),
                })
            })?,
    )?;

    registry.declare(
        Procedure::builder("divide")
            .doc("Divide `a` by `b`.")
            .params(["a", "b"])
            .sync(|a: f64, b: f64| -> anyhow::Result<f64> {
                if b == 0.0 {
                    anyhow::bail!("division by zero");
                }
                Ok(a / b)
            })?,
    )?;

    Ok(())
}
