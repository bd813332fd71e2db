//! Wallet connection state machine.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Verifying -> Granted | Denied
//!       ^              |             |                          |
//!       +--------------+-------------+----- disconnect ---------+
//! ```
//!
//! Every transition that invalidates the current address (disconnect, account
//! switch, chain switch) bumps an epoch. Verification results carry the epoch
//! they were started under and are dropped if it no longer matches, so a slow
//! lookup can never unlock content for a wallet that has since changed.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{AccessResult, AccessTier, ConnectionError, WalletAddress, WalletProvider};

use super::verifier::AccessVerifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected {
        address: WalletAddress,
    },
    Verifying {
        address: WalletAddress,
    },
    Granted {
        address: WalletAddress,
        tier: AccessTier,
        name: String,
    },
    Denied {
        address: WalletAddress,
    },
}

impl ConnectionState {
    #[must_use]
    pub fn address(&self) -> Option<&WalletAddress> {
        match self {
            Self::Disconnected | Self::Connecting => None,
            Self::Connected { address }
            | Self::Verifying { address }
            | Self::Granted { address, .. }
            | Self::Denied { address } => Some(address),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Connecting | Self::Verifying { .. })
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Proof that a verification was started for a given address and epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationTicket {
    epoch: u64,
    address: WalletAddress,
}

impl VerificationTicket {
    pub fn address(&self) -> &WalletAddress {
        &self.address
    }
}

/// Client-held connection state for one user session
pub struct ConnectionFlow {
    provider: Arc<dyn WalletProvider>,
    state: ConnectionState,
    last_result: Option<AccessResult>,
    last_error: Option<ConnectionError>,
    epoch: u64,
}

impl ConnectionFlow {
    #[must_use]
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            state: ConnectionState::Disconnected,
            last_result: None,
            last_error: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn last_result(&self) -> Option<&AccessResult> {
        self.last_result.as_ref()
    }

    /// Transient notice for the UI; cleared by the next successful transition
    pub fn last_error(&self) -> Option<&ConnectionError> {
        self.last_error.as_ref()
    }

    pub fn address(&self) -> Option<&WalletAddress> {
        self.state.address()
    }

    fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn enter_connected(&mut self, address: WalletAddress) {
        self.invalidate();
        self.state = ConnectionState::Connected { address };
        self.last_result = None;
        self.last_error = None;
    }

    fn first_account(accounts: &[String]) -> Result<Option<WalletAddress>, ConnectionError> {
        accounts
            .first()
            .map(|a| WalletAddress::from_str(a).map_err(|e| ConnectionError::Provider(e.to_string())))
            .transpose()
    }

    /// Ask the provider for accounts and connect to the first one.
    ///
    /// Already-connected flows return the current address without prompting.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> Result<WalletAddress, ConnectionError> {
        if let Some(address) = self.state.address() {
            return Ok(*address);
        }

        if !self.provider.is_available() {
            warn!("Connect requested but no wallet provider is available");
            self.last_error = Some(ConnectionError::ProviderUnavailable);
            return Err(ConnectionError::ProviderUnavailable);
        }

        self.state = ConnectionState::Connecting;
        let outcome = self
            .provider
            .request_accounts()
            .await
            .and_then(|accounts| {
                Self::first_account(&accounts)?.ok_or_else(|| {
                    ConnectionError::Provider("Wallet returned no accounts".to_string())
                })
            });

        match outcome {
            Ok(address) => {
                info!(address = %address, "Wallet connected");
                self.enter_connected(address);
                Ok(address)
            }
            Err(e) => {
                warn!(error = %e, "Wallet connection failed");
                self.state = ConnectionState::Disconnected;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Rebuild the connection from already-authorized accounts without
    /// prompting, as after a page reload.
    pub async fn restore(&mut self) -> Option<WalletAddress> {
        if !self.provider.is_available() || self.state.address().is_some() {
            return self.state.address().copied();
        }

        match self.provider.accounts().await {
            Ok(accounts) => match Self::first_account(&accounts) {
                Ok(Some(address)) => {
                    debug!(address = %address, "Restored wallet connection");
                    self.enter_connected(address);
                    Some(address)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed account from provider");
                    None
                }
            },
            Err(e) => {
                debug!(error = %e, "Could not restore wallet connection");
                None
            }
        }
    }

    /// Enter `Verifying` for the connected address.
    ///
    /// Fails if nothing is connected or a verification is already running.
    pub fn begin_verification(&mut self) -> Result<VerificationTicket, ConnectionError> {
        let address = match &self.state {
            ConnectionState::Verifying { .. } => {
                return Err(ConnectionError::VerificationInFlight);
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                return Err(ConnectionError::NotConnected);
            }
            ConnectionState::Connected { address }
            | ConnectionState::Granted { address, .. }
            | ConnectionState::Denied { address } => *address,
        };

        self.invalidate();
        self.state = ConnectionState::Verifying { address };
        Ok(VerificationTicket {
            epoch: self.epoch,
            address,
        })
    }

    /// Apply a verification result. Returns `false` and leaves state untouched
    /// when the ticket is stale.
    pub fn complete_verification(
        &mut self,
        ticket: VerificationTicket,
        result: AccessResult,
    ) -> bool {
        let current = matches!(
            &self.state,
            ConnectionState::Verifying { address } if *address == ticket.address
        );
        if ticket.epoch != self.epoch || !current {
            debug!(address = %ticket.address, "Discarding stale verification result");
            return false;
        }

        self.state = match (&result.name, result.granted) {
            (Some(name), true) => ConnectionState::Granted {
                address: ticket.address,
                tier: result.tier,
                name: name.clone(),
            },
            _ => ConnectionState::Denied {
                address: ticket.address,
            },
        };
        self.last_result = Some(result);
        true
    }

    /// Verify the connected address and apply the result
    pub async fn verify(&mut self, verifier: &AccessVerifier) -> Result<AccessResult, ConnectionError> {
        let ticket = self.begin_verification()?;
        let report = verifier.verify_address(ticket.address()).await;
        let result = report.result.clone();
        self.complete_verification(ticket, report.result);
        Ok(result)
    }

    /// Explicit disconnect; clears address, tier and name
    pub fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            info!("Wallet disconnected");
        }
        self.invalidate();
        self.state = ConnectionState::Disconnected;
        self.last_result = None;
        self.last_error = None;
    }

    /// Provider reported a new account list
    pub fn on_accounts_changed(&mut self, accounts: &[String]) {
        if self.state.address().is_none() {
            return;
        }

        match Self::first_account(accounts) {
            Ok(None) => self.disconnect(),
            Ok(Some(address)) if Some(&address) == self.state.address() => {}
            Ok(Some(address)) => {
                info!(address = %address, "Wallet account switched");
                self.enter_connected(address);
            }
            Err(e) => {
                warn!(error = %e, "Malformed account from provider, disconnecting");
                self.disconnect();
                self.last_error = Some(e);
            }
        }
    }

    /// Provider switched chains; everything is reset
    pub fn on_chain_changed(&mut self) {
        info!("Chain changed, resetting wallet state");
        self.disconnect();
    }
}
