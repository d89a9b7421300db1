//! Domain operations over the pass-cli runner and normalizer
//!
//! `PassClient` is the public API of the integration layer. It owns the
//! runner seam, the persisted cache, and the session mode; callers (list
//! views, the CLI binary) consume its typed results and map errors 1:1
//! to user-facing states via [`crate::PassCliError::kind`].

use std::sync::Arc;

use crate::cache::Store;
use crate::config::Config;
use crate::model::{GeneratePasswordOptions, Item, ItemDetail, PasswordScore, Vault};
use crate::normalize;
use crate::runner::{CliRunner, ProcessRunner};
use crate::{PassCliError, Result};

/// Display name used when a vault lookup cannot resolve a share id.
const UNKNOWN_VAULT: &str = "Unknown Vault";

/// Session over the Proton Pass CLI.
pub struct PassClient {
    config: Config,
    runner: Arc<dyn CliRunner>,
    store: Store,
    /// Synthetic-data session: the cache is cleared at construction and
    /// never written, so no real data leaks into the mode.
    demo: bool,
}

impl PassClient {
    /// Create a client over an explicit runner and store.
    pub fn new(config: Config, runner: Arc<dyn CliRunner>, store: Store) -> Self {
        Self {
            config,
            runner,
            store,
            demo: false,
        }
    }

    /// Create a live client: real process runner, default cache location.
    pub fn open(config: Config) -> Self {
        let runner = Arc::new(ProcessRunner::new(&config.cli));
        Self::new(config, runner, Store::open_default())
    }

    /// Create a synthetic-data session.
    pub fn demo(config: Config, runner: Arc<dyn CliRunner>, store: Store) -> Self {
        store.clear();
        Self {
            config,
            runner,
            store,
            demo: true,
        }
    }

    /// Lightweight authenticated probe. A `NotAuthenticated` failure is
    /// collapsed to `false`; every other failure propagates.
    pub async fn check_authenticated(&self) -> Result<bool> {
        match self
            .runner
            .invoke(&["user", "get", "--output", "json"])
            .await
        {
            Ok(_) => Ok(true),
            Err(PassCliError::NotAuthenticated) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List all vaults, writing through to the vault cache slot.
    pub async fn list_vaults(&self) -> Result<Vec<Vault>> {
        let raw = self
            .runner
            .invoke(&["vault", "list", "--output", "json"])
            .await?;
        let vaults = normalize::vaults(&raw)?;
        if !self.demo {
            self.store.write_vaults(&vaults);
        }
        Ok(vaults)
    }

    async fn vault_name(&self, share_id: &str) -> Result<String> {
        let vaults = self.list_vaults().await?;
        Ok(vaults
            .into_iter()
            .find(|v| v.share_id == share_id)
            .map(|v| v.name)
            .unwrap_or_else(|| UNKNOWN_VAULT.to_string()))
    }

    async fn fetch_vault_items(&self, share_id: &str, vault_name: &str) -> Result<Vec<Item>> {
        let raw = self
            .runner
            .invoke(&["item", "list", "--share-id", share_id, "--output", "json"])
            .await?;
        normalize::items(&raw, vault_name)
    }

    /// List items, either for one vault or aggregated across all of
    /// them. In the aggregate case, one vault's listing failure is
    /// logged and skipped instead of failing the whole call.
    pub async fn list_items(&self, vault_share_id: Option<&str>) -> Result<Vec<Item>> {
        match vault_share_id {
            Some(share_id) => {
                let name = self.vault_name(share_id).await?;
                self.fetch_vault_items(share_id, &name).await
            }
            None => {
                let vaults = self.list_vaults().await?;
                let mut all = Vec::new();
                for vault in &vaults {
                    match self.fetch_vault_items(&vault.share_id, &vault.name).await {
                        Ok(mut items) => all.append(&mut items),
                        Err(e) => tracing::warn!(
                            vault = %vault.name,
                            error = %e,
                            "skipping vault, item listing failed"
                        ),
                    }
                }
                if !self.demo {
                    self.store.write_items(&all);
                }
                Ok(all)
            }
        }
    }

    /// Fetch one item's full detail.
    pub async fn get_item_detail(&self, share_id: &str, item_id: &str) -> Result<ItemDetail> {
        let name = self.vault_name(share_id).await?;
        let raw = self
            .runner
            .invoke(&[
                "item", "view", "--share-id", share_id, "--item-id", item_id, "--output", "json",
            ])
            .await?;
        normalize::item_detail(&raw, &name)
    }

    /// Fetch one TOTP code for an item. Fails with `InvalidOutput` when
    /// the item has no TOTP; callers cross-check against the item's
    /// `has_totp` flag in their own display logic.
    pub async fn get_totp_code(&self, share_id: &str, item_id: &str) -> Result<String> {
        let raw = self
            .runner
            .invoke(&[
                "item", "totp", "--share-id", share_id, "--item-id", item_id, "--output", "json",
            ])
            .await?;
        normalize::totp_code(&raw)
    }

    /// Generate a password. `None` uses the configured defaults; only
    /// explicitly provided options are forwarded, everything omitted
    /// defers to the tool's own defaults.
    pub async fn generate_password(
        &self,
        options: Option<GeneratePasswordOptions>,
    ) -> Result<String> {
        let options = options.unwrap_or_else(|| self.config.default_password_options());
        let args = password_args(&options);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let raw = self.runner.invoke(&arg_refs).await?;
        Ok(raw.trim().to_string())
    }

    /// Score a password.
    ///
    /// The password travels as an argv element; pass-cli's score
    /// subcommand has no stdin mode.
    pub async fn score_password(&self, password: &str) -> Result<PasswordScore> {
        let raw = self
            .runner
            .invoke(&["password", "score", password, "--output", "json"])
            .await?;
        normalize::score(&raw)
    }

    /// Cached vault list, if fresh. Non-blocking, for instant first paint.
    pub fn cached_vaults(&self) -> Option<Vec<Vault>> {
        self.store.vaults()
    }

    /// Cached flat item list, if fresh.
    pub fn cached_items(&self) -> Option<Vec<Item>> {
        self.store.items()
    }

    pub fn clear_cache(&self) {
        self.store.clear();
    }
}

fn password_args(options: &GeneratePasswordOptions) -> Vec<String> {
    let mut args = vec![
        "password".to_string(),
        "generate".to_string(),
        "--type".to_string(),
    ];
    match options {
        GeneratePasswordOptions::Random {
            length,
            numbers,
            uppercase,
            symbols,
        } => {
            args.push("random".to_string());
            if let Some(length) = length {
                args.push("--length".to_string());
                args.push(length.to_string());
            }
            for (flag, value) in [
                ("--numbers", numbers),
                ("--uppercase", uppercase),
                ("--symbols", symbols),
            ] {
                if let Some(value) = value {
                    args.push(flag.to_string());
                    args.push(value.to_string());
                }
            }
        }
        GeneratePasswordOptions::Passphrase {
            words,
            separator,
            capitalize,
        } => {
            args.push("memorable".to_string());
            if let Some(words) = words {
                args.push("--words".to_string());
                args.push(words.to_string());
            }
            if let Some(separator) = separator {
                args.push("--separator".to_string());
                args.push(separator.clone());
            }
            if let Some(capitalize) = capitalize {
                args.push("--capitalize".to_string());
                args.push(capitalize.to_string());
            }
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CACHE_TTL;
    use crate::model::ItemType;
    use crate::runner::mock::MockRunner;
    use crate::ErrorKind;
    use tempfile::TempDir;

    const VAULTS_JSON: &str = r#"[
        {"shareId":"sA","name":"Personal","itemCount":2,"role":"owner"},
        {"shareId":"sB","name":"Work","itemCount":1,"role":"editor"}]"#;

    fn client_with(tmp: &TempDir) -> (PassClient, Arc<MockRunner>) {
        let runner = Arc::new(MockRunner::new());
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);
        let client = PassClient::new(Config::default(), runner.clone(), store);
        (client, runner)
    }

    #[tokio::test]
    async fn check_authenticated_collapses_only_auth_failures() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);

        runner.respond(&["user", "get", "--output", "json"], r#"{"email":"a@b.c"}"#);
        assert!(client.check_authenticated().await.unwrap());

        runner.fail(
            &["user", "get", "--output", "json"],
            ErrorKind::NotAuthenticated,
            "",
        );
        assert!(!client.check_authenticated().await.unwrap());

        runner.fail(
            &["user", "get", "--output", "json"],
            ErrorKind::NetworkError,
            "connection refused",
        );
        let err = client.check_authenticated().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn list_vaults_normalizes_and_caches() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(&["vault", "list", "--output", "json"], VAULTS_JSON);

        let vaults = client.list_vaults().await.unwrap();
        assert_eq!(vaults.len(), 2);
        assert_eq!(client.cached_vaults().unwrap(), vaults);
    }

    #[tokio::test]
    async fn aggregate_listing_skips_a_failing_vault() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(&["vault", "list", "--output", "json"], VAULTS_JSON);
        runner.respond(
            &["item", "list", "--share-id", "sA", "--output", "json"],
            r#"[{"itemId":"i1","shareId":"sA","data":{"metadata":{"name":"Bank"}}}]"#,
        );
        runner.fail(
            &["item", "list", "--share-id", "sB", "--output", "json"],
            ErrorKind::NetworkError,
            "connection reset",
        );

        let items = client.list_items(None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Bank");
        assert_eq!(items[0].vault_name, "Personal");
        // The partial aggregate still lands in the cache.
        assert_eq!(client.cached_items().unwrap(), items);
    }

    #[tokio::test]
    async fn scoped_listing_filters_trashed_and_resolves_vault_name() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(&["vault", "list", "--output", "json"], VAULTS_JSON);
        runner.respond(
            &["item", "list", "--share-id", "sA", "--output", "json"],
            r#"[{"itemId":"i1","shareId":"sA","state":"Trashed",
                 "data":{"metadata":{"name":"Old login"}}},
                {"itemId":"i2","shareId":"sA","state":"Active",
                 "data":{"metadata":{"name":"Current login"},
                         "content":{"Login":{"username":"me"}}}}]"#,
        );

        let items = client.list_items(Some("sA")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Current login");
        assert_eq!(items[0].kind, ItemType::Login);
        assert_eq!(items[0].vault_name, "Personal");
    }

    #[tokio::test]
    async fn unresolvable_share_id_falls_back_to_unknown_vault() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(&["vault", "list", "--output", "json"], VAULTS_JSON);
        runner.respond(
            &["item", "list", "--share-id", "sZ", "--output", "json"],
            r#"[{"itemId":"i9","shareId":"sZ","data":{"metadata":{"name":"Stranger"}}}]"#,
        );

        let items = client.list_items(Some("sZ")).await.unwrap();
        assert_eq!(items[0].vault_name, "Unknown Vault");
    }

    #[tokio::test]
    async fn totp_code_applies_tie_break() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(
            &["item", "totp", "--share-id", "sA", "--item-id", "i1", "--output", "json"],
            r#"{"sms":"111111","totp":"222222"}"#,
        );
        assert_eq!(client.get_totp_code("sA", "i1").await.unwrap(), "222222");
    }

    #[tokio::test]
    async fn generate_forwards_only_provided_options() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(
            &["password", "generate", "--type", "random", "--length", "24", "--symbols", "true"],
            "p@ssw0rd-from-cli\n",
        );

        let options = GeneratePasswordOptions::Random {
            length: Some(24),
            numbers: None,
            uppercase: None,
            symbols: Some(true),
        };
        let password = client.generate_password(Some(options)).await.unwrap();
        assert_eq!(password, "p@ssw0rd-from-cli");
    }

    #[tokio::test]
    async fn generate_defaults_come_from_config() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(
            &["password", "generate", "--type", "random", "--length", "20"],
            "default-length-password",
        );
        let password = client.generate_password(None).await.unwrap();
        assert_eq!(password, "default-length-password");
    }

    #[tokio::test]
    async fn passphrase_options_map_to_memorable() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(
            &["password", "generate", "--type", "memorable", "--words", "5", "--separator", "-"],
            "correct-horse-battery-staple-ok",
        );
        let options = GeneratePasswordOptions::Passphrase {
            words: Some(5),
            separator: Some("-".to_string()),
            capitalize: None,
        };
        let password = client.generate_password(Some(options)).await.unwrap();
        assert_eq!(password, "correct-horse-battery-staple-ok");
    }

    #[tokio::test]
    async fn score_password_normalizes() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(
            &["password", "score", "hunter2", "--output", "json"],
            r#"{"numericScore":5,"passwordScore":"Vulnerable","penalties":["Common"]}"#,
        );
        let score = client.score_password("hunter2").await.unwrap();
        assert_eq!(score.password_score, "Vulnerable");
        assert_eq!(score.penalties.unwrap(), vec!["Common".to_string()]);
    }

    #[tokio::test]
    async fn item_detail_resolves_vault_and_fields() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = client_with(&tmp);
        runner.respond(&["vault", "list", "--output", "json"], VAULTS_JSON);
        runner.respond(
            &["item", "view", "--share-id", "sB", "--item-id", "i7", "--output", "json"],
            r#"{"data":{"itemId":"i7","shareId":"sB",
                 "data":{"metadata":{"name":"VPN","note":"team creds"},
                         "content":{"Login":{"username":"vpn-user","password":"pw"}}}}}"#,
        );

        let detail = client.get_item_detail("sB", "i7").await.unwrap();
        assert_eq!(detail.item.vault_name, "Work");
        assert_eq!(detail.password.as_deref(), Some("pw"));
        assert_eq!(detail.note.as_deref(), Some("team creds"));
    }

    #[tokio::test]
    async fn demo_session_clears_and_never_writes_cache() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);
        store.write_items(&[]);

        let runner = Arc::new(MockRunner::new());
        runner.respond(&["vault", "list", "--output", "json"], VAULTS_JSON);
        let client = PassClient::demo(
            Config::default(),
            runner,
            Store::new(tmp.path().to_path_buf(), CACHE_TTL),
        );

        assert!(client.cached_items().is_none());
        client.list_vaults().await.unwrap();
        assert!(client.cached_vaults().is_none());
    }
}
