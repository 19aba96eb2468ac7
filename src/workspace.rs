//! In-memory dashboard state: the last resolved rate and the transaction the
//! user is typing in, kept per user and currency.
//!
//! Nothing here is persisted. Restarting the server, or consolidating a
//! ledger, starts the dashboard from scratch.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    fiat::Fiat,
    rate::{ConnectionStatus, Rate, convert},
    transaction::TransactionType,
};

/// The rate last used by a dashboard, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateState {
    /// The resolved rate, `None` until the first refresh finishes.
    pub rate: Option<Rate>,
}

impl RateState {
    /// Whether the last refresh reached the marketplace.
    pub fn status(&self) -> ConnectionStatus {
        self.rate
            .as_ref()
            .map_or(ConnectionStatus::Idle, |rate| rate.status)
    }

    /// Fiat units per USDT.
    pub fn value(&self) -> Option<f64> {
        self.rate.as_ref().map(|rate| rate.value)
    }

    /// When the rate was last refreshed.
    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        self.rate.as_ref().map(|rate| rate.fetched_at)
    }
}

/// A transaction that has been typed in but not added to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub transaction_type: TransactionType,
    pub amount_fiat: Option<f64>,
    /// Derived from `amount_fiat` and the current rate unless the user typed
    /// one in.
    pub amount_usdt: Option<f64>,
    /// The USDT amount typed in by the user.
    pub manual_usdt: Option<f64>,
    pub description: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            transaction_type: TransactionType::Income,
            amount_fiat: None,
            amount_usdt: None,
            manual_usdt: None,
            description: String::new(),
        }
    }
}

impl Draft {
    /// Convert the fiat amount again, e.g. after the rate changed.
    pub fn recompute(&mut self, rate: Option<f64>) {
        self.amount_usdt = match (self.manual_usdt, self.amount_fiat, rate) {
            (Some(manual), _, _) => Some(manual),
            (None, Some(amount), Some(rate)) => convert(amount, rate),
            _ => None,
        };
    }
}

/// The dashboard state for one user and currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workspace {
    pub rate: RateState,
    pub draft: Draft,
}

impl Workspace {
    /// Use `rate` from now on and reconvert the draft with it, replacing any
    /// USDT amount the user typed in.
    ///
    /// Transactions already in the ledger keep the USDT amount they were
    /// added with.
    pub fn set_rate(&mut self, rate: Rate) {
        self.rate.rate = Some(rate);
        self.draft.manual_usdt = None;
        self.draft.recompute(self.rate.value());
    }

    /// Use the USDT amount typed in by the user instead of the converted one.
    pub fn set_manual_usdt(&mut self, amount_usdt: f64) {
        self.draft.manual_usdt = Some(amount_usdt.abs()).filter(|amount| amount.is_finite());
        self.draft.recompute(self.rate.value());
    }

    /// Replace the draft's inputs and convert the new fiat amount.
    pub fn set_draft(
        &mut self,
        transaction_type: TransactionType,
        amount_fiat: Option<f64>,
        description: &str,
    ) {
        self.draft.transaction_type = transaction_type;
        self.draft.amount_fiat = amount_fiat.filter(|amount| amount.is_finite());
        self.draft.manual_usdt = None;
        description.clone_into(&mut self.draft.description);
        self.draft.recompute(self.rate.value());
    }

    /// Clear the draft but keep the rate.
    pub fn clear_draft(&mut self) {
        self.draft = Draft::default();
    }

    /// Forget both the draft and the rate.
    pub fn reset(&mut self) {
        *self = Workspace::default();
    }
}

/// The workspaces of every signed in user.
#[derive(Debug, Clone, Default)]
pub struct Workspaces(Arc<Mutex<HashMap<(UserID, Fiat), Workspace>>>);

impl Workspaces {
    /// A copy of the workspace for `user_id` and `fiat`, or an empty one.
    ///
    /// # Errors
    /// Returns [Error::WorkspaceLockError] if the lock is poisoned.
    pub fn get(&self, user_id: UserID, fiat: Fiat) -> Result<Workspace, Error> {
        let workspaces = self.0.lock().map_err(|error| {
            tracing::error!("could not acquire workspace lock: {error}");
            Error::WorkspaceLockError
        })?;

        Ok(workspaces
            .get(&(user_id, fiat))
            .cloned()
            .unwrap_or_default())
    }

    /// Change the workspace for `user_id` and `fiat` with `f`, creating it
    /// first if needed, and return what `f` returns.
    ///
    /// # Errors
    /// Returns [Error::WorkspaceLockError] if the lock is poisoned.
    pub fn update<F, R>(&self, user_id: UserID, fiat: Fiat, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Workspace) -> R,
    {
        let mut workspaces = self.0.lock().map_err(|error| {
            tracing::error!("could not acquire workspace lock: {error}");
            Error::WorkspaceLockError
        })?;

        Ok(f(workspaces.entry((user_id, fiat)).or_default()))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        auth::UserID,
        fiat::Fiat,
        rate::{ConnectionStatus, FetchError, FetchOutcome, Rate},
        transaction::TransactionType,
    };

    use super::{Workspace, Workspaces};

    fn cop_rate(value: f64) -> Rate {
        FetchOutcome {
            result: Ok(value),
            fetched_at: datetime!(2025-06-01 12:00 UTC),
        }
        .resolve(Fiat::Cop)
    }

    #[test]
    fn new_workspace_is_idle() {
        let workspace = Workspace::default();

        assert_eq!(workspace.rate.status(), ConnectionStatus::Idle);
        assert_eq!(workspace.rate.value(), None);
        assert_eq!(workspace.draft.amount_usdt, None);
    }

    #[test]
    fn draft_is_converted_with_current_rate() {
        let mut workspace = Workspace::default();
        workspace.set_rate(cop_rate(4006.0));

        workspace.set_draft(TransactionType::Income, Some(80120.0), "");

        assert_eq!(workspace.draft.amount_usdt, Some(20.0));
    }

    #[test]
    fn draft_without_rate_has_no_usdt_amount() {
        let mut workspace = Workspace::default();

        workspace.set_draft(TransactionType::Expense, Some(100.0), "Lunch");

        assert_eq!(workspace.draft.amount_fiat, Some(100.0));
        assert_eq!(workspace.draft.amount_usdt, None);
        assert_eq!(workspace.draft.description, "Lunch");
    }

    #[test]
    fn rate_change_recomputes_draft() {
        let mut workspace = Workspace::default();
        workspace.set_rate(cop_rate(4000.0));
        workspace.set_draft(TransactionType::Income, Some(80120.0), "");
        assert_eq!(workspace.draft.amount_usdt, Some(20.03));

        workspace.set_rate(cop_rate(4006.0));

        assert_eq!(workspace.draft.amount_usdt, Some(20.0));
    }

    #[test]
    fn typed_usdt_amount_replaces_conversion() {
        let mut workspace = Workspace::default();
        workspace.set_rate(cop_rate(4006.0));
        workspace.set_draft(TransactionType::Expense, Some(80120.0), "");

        workspace.set_manual_usdt(19.5);

        assert_eq!(workspace.draft.amount_usdt, Some(19.5));

        workspace.set_draft(TransactionType::Expense, Some(40060.0), "");

        assert_eq!(workspace.draft.manual_usdt, None);
        assert_eq!(workspace.draft.amount_usdt, Some(10.0));
    }

    #[test]
    fn manual_rate_recomputes_draft() {
        let mut workspace = Workspace::default();
        workspace.set_rate(cop_rate(4006.0));
        workspace.set_draft(TransactionType::Income, Some(80120.0), "");
        workspace.set_manual_usdt(25.0);

        workspace.set_rate(Rate::try_manual(4000.0, datetime!(2025-06-01 12:05 UTC)).unwrap());

        assert_eq!(workspace.rate.value(), Some(4000.0));
        assert_eq!(workspace.rate.status(), ConnectionStatus::Connected);
        assert_eq!(workspace.draft.amount_usdt, Some(20.03));
    }

    #[test]
    fn fallback_rate_marks_error() {
        let mut workspace = Workspace::default();

        workspace.set_rate(FetchOutcome::now(Err(FetchError::NoAds)).resolve(Fiat::Ves));

        assert_eq!(workspace.rate.status(), ConnectionStatus::Error);
        assert_eq!(workspace.rate.value(), Some(180.0));
    }

    #[test]
    fn reset_clears_rate_and_draft() {
        let mut workspace = Workspace::default();
        workspace.set_rate(cop_rate(4006.0));
        workspace.set_draft(TransactionType::Income, Some(80120.0), "Salary");

        workspace.reset();

        assert_eq!(workspace, Workspace::default());
    }

    #[test]
    fn workspaces_are_kept_per_user_and_fiat() {
        let workspaces = Workspaces::default();
        let user_id = UserID::new(1);

        workspaces
            .update(user_id, Fiat::Cop, |workspace| {
                workspace.set_rate(cop_rate(4006.0))
            })
            .unwrap();

        assert_eq!(
            workspaces.get(user_id, Fiat::Cop).unwrap().rate.value(),
            Some(4006.0)
        );
        assert_eq!(workspaces.get(user_id, Fiat::Ves).unwrap().rate.value(), None);
        assert_eq!(
            workspaces.get(UserID::new(2), Fiat::Cop).unwrap().rate.value(),
            None
        );
    }
}
