use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// What a matched rule tells the caller to do with the transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AutoPost,
    #[default]
    Review,
    Reject,
}

impl Action {
    pub fn parse(s: &str) -> Option<Action> {
        match s.trim() {
            "AUTO_POST" => Some(Action::AutoPost),
            "REVIEW" => Some(Action::Review),
            "REJECT" => Some(Action::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AutoPost => "AUTO_POST",
            Action::Review => "REVIEW",
            Action::Reject => "REJECT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of condition drove the winning rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedBy {
    Mcc,
    Merchant,
    Other,
    #[serde(rename = "none")]
    Unmatched,
}

impl MatchedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedBy::Mcc => "mcc",
            MatchedBy::Merchant => "merchant",
            MatchedBy::Other => "other",
            MatchedBy::Unmatched => "none",
        }
    }
}

impl fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input fields a rule condition can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Mcc,
    Merchant,
    Amount,
    UserTeam,
    UserEmail,
    StateMatch,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Mcc,
        Field::Merchant,
        Field::Amount,
        Field::UserTeam,
        Field::UserEmail,
        Field::StateMatch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Mcc => "mcc",
            Field::Merchant => "merchant",
            Field::Amount => "amount",
            Field::UserTeam => "user_team",
            Field::UserEmail => "user_email",
            Field::StateMatch => "state_match",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transaction amount as received.
///
/// Requests normally carry a number. A value that cannot be read as a
/// decimal is kept as text so that amount conditions fail per rule instead
/// of rejecting the whole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Number(Decimal),
    Text(String),
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Number(Decimal::ZERO)
    }
}

impl Amount {
    pub fn parse(s: &str) -> Amount {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Amount::default();
        }
        match Decimal::from_str(trimmed) {
            Ok(d) => Amount::Number(d),
            Err(_) => Amount::Text(trimmed.to_string()),
        }
    }

    /// Numbers outside the decimal range (and NaN or infinity) are kept as
    /// text, like any other unreadable amount.
    pub fn from_f64(f: f64) -> Amount {
        match f64_to_decimal(f) {
            Some(d) => Amount::Number(d),
            None => Amount::Text(f.to_string()),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Amount::Number(d) => Some(*d),
            Amount::Text(_) => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(d) => write!(f, "{d}"),
            Amount::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Number(d) => match d.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&d.to_string()),
            },
            Amount::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Number(f64),
            Text(String),
        }

        Ok(match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(f) => Amount::from_f64(f),
            RawAmount::Text(s) => Amount::parse(&s),
        })
    }
}

/// Convert f64 to Decimal through its shortest string form, so that
/// 59.99_f64 becomes 59.99 rather than 59.98999...
fn f64_to_decimal(f: f64) -> Option<Decimal> {
    let s = format!("{f}");
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::try_from(f).ok())
}

/// A borrowed view of one input field, as seen by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(Decimal),
}

impl FieldValue<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "a number",
        }
    }
}

/// Flat evaluation request, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRequest {
    pub mcc: String,
    pub merchant: String,
    pub amount: Amount,
    pub user_team: String,
    pub user_email: String,
    pub state_match: String,
}

/// Normalized transaction and employee attributes consumed by evaluation.
///
/// Every construction path goes through `From<EvaluationRequest>`, so the
/// merchant is upper-cased exactly once regardless of where the input came
/// from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EvaluationRequest")]
pub struct InputContext {
    mcc: String,
    merchant: String,
    amount: Amount,
    user_team: String,
    user_email: String,
    state_match: String,
}

impl From<EvaluationRequest> for InputContext {
    fn from(req: EvaluationRequest) -> Self {
        InputContext {
            mcc: req.mcc,
            merchant: req.merchant.to_uppercase(),
            amount: req.amount,
            user_team: req.user_team,
            user_email: req.user_email,
            state_match: req.state_match,
        }
    }
}

impl InputContext {
    /// Build an input from raw transaction and employee records, applying
    /// the usual field fallbacks.
    pub fn from_records(txn: &TransactionRecord, employee: &EmployeeRecord) -> InputContext {
        EvaluationRequest {
            mcc: first_non_empty(&[&txn.merchant_category_code, &txn.mcc]),
            merchant: first_non_empty(&[
                &txn.raw_merchant_name,
                &txn.merchant_name,
                &txn.merchant,
            ]),
            amount: txn.amount.clone().unwrap_or_default(),
            user_team: first_non_empty(&[&employee.team, &employee.department]),
            user_email: first_non_empty(&[&txn.user_email]),
            state_match: first_non_empty(&[&txn.state_match]),
        }
        .into()
    }

    pub fn mcc(&self) -> &str {
        &self.mcc
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn user_team(&self) -> &str {
        &self.user_team
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn state_match(&self) -> &str {
        &self.state_match
    }

    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Mcc => FieldValue::Text(&self.mcc),
            Field::Merchant => FieldValue::Text(&self.merchant),
            Field::Amount => match &self.amount {
                Amount::Number(d) => FieldValue::Number(*d),
                Amount::Text(s) => FieldValue::Text(s),
            },
            Field::UserTeam => FieldValue::Text(&self.user_team),
            Field::UserEmail => FieldValue::Text(&self.user_email),
            Field::StateMatch => FieldValue::Text(&self.state_match),
        }
    }
}

fn first_non_empty(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Card transaction as exported by the spend-management system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionRecord {
    pub uuid: Option<String>,
    pub id: Option<String>,
    pub merchant_category_code: Option<String>,
    pub mcc: Option<String>,
    pub raw_merchant_name: Option<String>,
    pub merchant_name: Option<String>,
    pub merchant: Option<String>,
    pub amount: Option<Amount>,
    pub user_email: Option<String>,
    #[serde(rename = "state_match")]
    pub state_match: Option<String>,
    pub budget_name: Option<String>,
}

impl TransactionRecord {
    pub fn transaction_id(&self) -> Option<&str> {
        self.uuid
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.id.as_deref())
    }
}

/// Employee attributes used by team-scoped rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeRecord {
    pub team: Option<String>,
    pub department: Option<String>,
}
