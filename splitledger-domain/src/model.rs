use std::{
    borrow::Cow,
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use chrono::{DateTime, Utc};

/// Monetary amount in the smallest currency unit.
///
/// All settlement math is integer arithmetic; there is no floating point
/// anywhere in the engine. Equal splits distribute the division remainder
/// explicitly (see [`crate::services::split_evenly`]), so sums of shares are
/// exact and [`Money::TOLERANCE`] is only needed when comparing against
/// externally supplied totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// One smallest currency unit. Balances within this of zero are treated
    /// as settled, and transfers at or below it are dropped as dust.
    pub const TOLERANCE: Self = Self(1);

    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    pub fn amount(self) -> i64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn signum(self) -> i64 {
        self.0.signum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Identifier of a participant within one shared ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(pub u64);

/// Identifier of a platform account, scoped to the whole platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(pub u64);

/// Identifier of a shared contribution (one shared transaction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContributionId(pub u64);

/// Identifier of a shared ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SharedLedgerId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ContributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SharedLedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a participant is: a platform account or a named guest.
///
/// A sum type rather than two nullable fields, so "both set" and "neither
/// set" states cannot be represented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Account { id: AccountId, username: String },
    Guest { name: String },
}

impl Identity {
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            Identity::Account { id, .. } => Some(*id),
            Identity::Guest { .. } => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }
}

/// One member of a shared ledger.
///
/// Participants are created while the ledger is open and are immutable
/// afterwards. Creation order is significant: it fixes which participants
/// receive the extra unit when an equal split does not divide evenly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub identity: Identity,
}

impl Participant {
    pub fn new(id: ParticipantId, identity: Identity) -> Self {
        Self { id, identity }
    }

    /// Human-readable name: the platform username, or `"<name> (guest)"`.
    pub fn display_name(&self) -> Cow<'_, str> {
        match &self.identity {
            Identity::Account { username, .. } => Cow::Borrowed(username.as_str()),
            Identity::Guest { name } => Cow::Owned(format!("{name} (guest)")),
        }
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.identity.account_id()
    }
}

/// Direction of a shared transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContributionKind {
    Expense,
    Income,
}

impl ContributionKind {
    /// Sign applied to fair-share obligations: expenses add to what a
    /// participant should pay, income subtracts from it.
    pub fn sign(self) -> i64 {
        match self {
            ContributionKind::Expense => 1,
            ContributionKind::Income => -1,
        }
    }
}

/// How much one participant paid toward a contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayerShare {
    pub participant_id: ParticipantId,
    pub amount_paid: Money,
}

/// One shared transaction and the record of who paid toward it.
///
/// Payer amounts are not required to sum to `amount`; a shortfall or excess
/// is a recorded, auditable state surfaced through
/// [`crate::services::LedgerSummary::unaccounted`], never silently corrected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub id: ContributionId,
    pub kind: ContributionKind,
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub recorded_by: AccountId,
    pub payers: Vec<PayerShare>,
}

impl Contribution {
    /// Total paid by one participant toward this contribution.
    pub fn paid_by(&self, participant: ParticipantId) -> Money {
        self.payers
            .iter()
            .filter(|payer| payer.participant_id == participant)
            .fold(Money::ZERO, |acc, payer| acc + payer.amount_paid)
    }

    /// `amount − Σ amount_paid`: zero when the payer records account for the
    /// full transaction amount.
    pub fn shortfall(&self) -> Money {
        let paid = self
            .payers
            .iter()
            .fold(Money::ZERO, |acc, payer| acc + payer.amount_paid);
        self.amount - paid
    }
}

/// One proposed peer-to-peer transfer from a debtor to a creditor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementSuggestion {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_display_name_is_tagged() {
        let guest = Participant::new(
            ParticipantId(1),
            Identity::Guest {
                name: "Maria".to_string(),
            },
        );
        assert_eq!(guest.display_name(), "Maria (guest)");
        assert_eq!(guest.account_id(), None);
    }

    #[test]
    fn account_display_name_is_username() {
        let member = Participant::new(
            ParticipantId(2),
            Identity::Account {
                id: AccountId(7),
                username: "jdoe".to_string(),
            },
        );
        assert_eq!(member.display_name(), "jdoe");
        assert_eq!(member.account_id(), Some(AccountId(7)));
    }

    #[test]
    fn shortfall_counts_missing_payer_amounts() {
        let contribution = Contribution {
            id: ContributionId(1),
            kind: ContributionKind::Expense,
            amount: Money::from_i64(100),
            category: "food".to_string(),
            description: None,
            created_at: Utc::now(),
            recorded_by: AccountId(1),
            payers: vec![PayerShare {
                participant_id: ParticipantId(1),
                amount_paid: Money::from_i64(60),
            }],
        };
        assert_eq!(contribution.shortfall(), Money::from_i64(40));
        assert_eq!(
            contribution.paid_by(ParticipantId(1)),
            Money::from_i64(60)
        );
        assert_eq!(contribution.paid_by(ParticipantId(2)), Money::ZERO);
    }
}
