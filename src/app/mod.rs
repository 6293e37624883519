//! Application state: wallet session, entry list, form and notifications.
//!
//! # Data Flow
//! ```text
//! mount()          → wallet check ∥ repository fetch
//! connect()        → request_access → get_public_key → session
//! submit_message() → form.rs validate → SubmissionWorkflow → local store → re-fetch
//! view.rs          → ConnectionPanel / FormView / EntryListView
//! ```

pub mod form;
pub mod view;

use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::blockchain::{BlockchainResult, ContractId, LedgerRpc, TxBuilder, WalletError, WalletProvider};
use crate::config::GuestbookConfig;
use crate::guestbook::entry::{now_millis, GuestbookEntry};
use crate::guestbook::{
    EntryRepository, EntrySource, LocalMessageStore, StoredMessage, SubmissionWorkflow,
    SubmitError,
};

pub use form::{FormError, MessageForm};
pub use view::{ConnectionPanel, EntryListView, EntryRow, FormView};

/// The account the user connected, held for this process only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub public_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub variant: NotificationVariant,
}

impl Notification {
    fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: Some(description.to_string()),
            variant: NotificationVariant::Default,
        }
    }

    fn destructive(title: &str, description: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            description: description.map(str::to_string),
            variant: NotificationVariant::Destructive,
        }
    }
}

/// What happened to a message that passed form validation.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Recorded on the ledger; the list has been refreshed.
    Sent,
    /// Not sent because no usable wallet session exists.
    WalletRequired,
    /// The workflow failed.
    Failed(SubmitError),
}

/// The guestbook application model.
pub struct GuestbookApp {
    wallet: Arc<dyn WalletProvider>,
    repository: EntryRepository,
    workflow: SubmissionWorkflow,
    store: LocalMessageStore,
    explorer_url: String,
    contract_id: String,
    session: Option<WalletSession>,
    entries: Vec<GuestbookEntry>,
    source: EntrySource,
    is_loading: bool,
    form: MessageForm,
    notifications: VecDeque<Notification>,
}

impl GuestbookApp {
    /// Wire the application from configuration and injected collaborators.
    pub fn new(
        config: &GuestbookConfig,
        rpc: Arc<dyn LedgerRpc>,
        wallet: Arc<dyn WalletProvider>,
    ) -> BlockchainResult<Self> {
        let builder = TxBuilder::new(
            ContractId::parse(&config.network.contract_id)?,
            config.network.network_passphrase.clone(),
            config.submission.base_fee,
            config.submission.tx_timeout_secs,
        );

        Ok(Self {
            repository: EntryRepository::new(
                rpc.clone(),
                wallet.clone(),
                builder.clone(),
                config.reader.clone(),
            ),
            workflow: SubmissionWorkflow::new(rpc, wallet.clone(), builder, config.submission.clone()),
            wallet,
            store: LocalMessageStore::new(&config.storage.data_dir),
            explorer_url: config.network.explorer_url.clone(),
            contract_id: config.network.contract_id.clone(),
            session: None,
            entries: Vec::new(),
            source: EntrySource::Ledger,
            is_loading: true,
            form: MessageForm::new(),
            notifications: VecDeque::new(),
        })
    }

    /// Initial load: restore an existing wallet session and fetch entries concurrently.
    pub async fn mount(&mut self) {
        self.is_loading = true;
        let (session, outcome) = tokio::join!(
            existing_session(self.wallet.as_ref()),
            self.repository.fetch()
        );

        if let Some(session) = session {
            tracing::info!(account = %session.public_key, "Restored wallet session");
            self.session = Some(session);
        }
        self.entries = outcome.entries;
        self.source = outcome.source;
        self.is_loading = false;
    }

    /// Re-fetch the entry list, replacing it wholesale.
    pub async fn refresh(&mut self) {
        self.is_loading = true;
        let outcome = self.repository.fetch().await;
        self.entries = outcome.entries;
        self.source = outcome.source;
        self.is_loading = false;
    }

    /// Ask the wallet for access and start a session.
    pub async fn connect(&mut self) -> Result<String, WalletError> {
        let result = match self.wallet.request_access().await {
            Ok(()) => self.wallet.get_public_key().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(public_key) => {
                tracing::info!(account = %public_key, "Wallet connected");
                self.session = Some(WalletSession {
                    public_key: public_key.clone(),
                });
                Ok(public_key)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wallet connection failed");
                self.notify(Notification::destructive(
                    "Wallet connection failed. Please make sure your wallet is available.",
                    None,
                ));
                Err(e)
            }
        }
    }

    /// Forget the session locally. The wallet keeps its permission.
    pub fn disconnect(&mut self) {
        self.session = None;
    }

    /// Validate and send a message.
    pub async fn submit_message(&mut self, text: &str) -> Result<SubmitOutcome, FormError> {
        self.submit_message_with_cancel(text, &CancellationToken::new())
            .await
    }

    /// Validate and send a message; `cancel` aborts the confirmation wait.
    pub async fn submit_message_with_cancel(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, FormError> {
        self.form.set_text(text);
        let message = self.form.validate()?;

        let Some(sender) = self.session.as_ref().map(|s| s.public_key.clone()) else {
            self.notify_wallet_required();
            return Ok(SubmitOutcome::WalletRequired);
        };

        self.form.begin_submit();
        let result = self.workflow.submit_with_cancel(&message, cancel).await;
        self.form.finish_submit();

        match result {
            Ok(_) => {
                self.store.append(StoredMessage::new(sender, message));
                self.notify(Notification::info(
                    "Message Sent!",
                    "Your message has been successfully recorded on the blockchain.",
                ));
                self.form.reset();
                self.refresh().await;
                Ok(SubmitOutcome::Sent)
            }
            Err(SubmitError::WalletNotConnected | SubmitError::WalletNotAllowed) => {
                tracing::info!(account = %sender, "Wallet no longer available, ending session");
                self.session = None;
                self.notify_wallet_required();
                Ok(SubmitOutcome::WalletRequired)
            }
            Err(e) => {
                self.notify(Notification::destructive(
                    "Error",
                    Some("An error occurred while sending your message."),
                ));
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }

    pub fn session(&self) -> Option<&WalletSession> {
        self.session.as_ref()
    }

    pub fn entries(&self) -> &[GuestbookEntry] {
        &self.entries
    }

    pub fn source(&self) -> EntrySource {
        self.source
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn form(&self) -> &MessageForm {
        &self.form
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Messages this machine has sent, from the local store.
    pub fn local_messages(&self) -> Vec<StoredMessage> {
        self.store.load()
    }

    pub fn clear_local_messages(&self) {
        self.store.clear();
    }

    pub fn connection_panel(&self) -> ConnectionPanel {
        match &self.session {
            None => ConnectionPanel::Disconnected,
            Some(session) => ConnectionPanel::Connected {
                address: session.public_key.clone(),
                short_address: view::truncate_address(&session.public_key),
                explorer_url: view::explorer_account_url(&self.explorer_url, &session.public_key),
            },
        }
    }

    pub fn form_view(&self) -> FormView {
        FormView {
            text: self.form.text().to_string(),
            counter: self.form.counter(),
            disabled: self.session.is_none() || self.form.is_submitting(),
            submitting: self.form.is_submitting(),
            error: self.form.error().map(|e| e.to_string()),
        }
    }

    pub fn entry_list_view(&self) -> EntryListView {
        EntryListView::build(&self.entries, self.is_loading, self.source.is_sample(), now_millis())
    }

    pub fn contract_url(&self) -> String {
        view::explorer_contract_url(&self.explorer_url, &self.contract_id)
    }

    fn notify_wallet_required(&mut self) {
        self.notify(Notification::destructive(
            "Wallet Connection Required",
            Some("Please connect your wallet to leave a message."),
        ));
    }

    fn notify(&mut self, notification: Notification) {
        tracing::debug!(title = %notification.title, "Notification queued");
        self.notifications.push_back(notification);
    }
}

/// The session a previously granted wallet resumes, if any. Errors count as none.
async fn existing_session(wallet: &dyn WalletProvider) -> Option<WalletSession> {
    if !wallet.is_connected().await.unwrap_or(false) {
        return None;
    }
    if !wallet.is_allowed().await.unwrap_or(false) {
        return None;
    }
    wallet
        .get_public_key()
        .await
        .ok()
        .map(|public_key| WalletSession { public_key })
}
