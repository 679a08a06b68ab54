pub mod clinical;
pub mod data;
pub mod notifications;
pub mod users;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use shared_config::AppConfig;
use shared_database::{PostgrestClient, Query};

/// Thin wrapper over the data client with get-or-create helpers, so seeding
/// can be re-run without duplicating catalog rows.
pub struct Seeder {
    pub db: PostgrestClient,
    pub rng: StdRng,
}

impl Seeder {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            rng: StdRng::from_entropy(),
        }
    }

    pub async fn rows(&self, table: &str, query: Query) -> Result<Vec<Value>> {
        self.db.select(table, &query).await
    }

    pub async fn find(&self, table: &str, query: Query) -> Result<Option<Value>> {
        self.db.select_one(table, &query).await
    }

    pub async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.db.insert(table, row).await
    }

    /// Returns the existing row matching `lookup`, or inserts `row`.
    /// The flag is true when a row was created.
    pub async fn get_or_create(&self, table: &str, lookup: Query, row: Value) -> Result<(Value, bool)> {
        if let Some(existing) = self.find(table, lookup).await? {
            return Ok((existing, false));
        }
        Ok((self.insert(table, row).await?, true))
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    /// Random 64-character hex digest for simulated file hashes and tokens.
    pub fn hex_digest(&mut self) -> String {
        (0..32)
            .map(|_| format!("{:02x}", self.rng.gen::<u8>()))
            .collect()
    }
}

pub fn id_of(row: &Value) -> Result<i64> {
    row.get("id")
        .or_else(|| row.get("usuario_id"))
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("row has no id: {}", row))
}

pub fn ids(rows: &[Value]) -> Result<Vec<i64>> {
    rows.iter().map(id_of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_rows_are_keyed_by_user_id() {
        assert_eq!(id_of(&json!({"id": 4})).unwrap(), 4);
        assert_eq!(id_of(&json!({"usuario_id": 9, "estado": "Activo"})).unwrap(), 9);
        assert!(id_of(&json!({"nombre": "sin id"})).is_err());
    }

    #[test]
    fn digests_are_hex() {
        let mut seeder = Seeder::new(&AppConfig::default());
        let digest = seeder.hex_digest();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
