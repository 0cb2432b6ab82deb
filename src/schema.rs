//! The shared statement schema: every enum and record the pipeline exchanges
//! with the LLM and the persistence collaborator, defined exactly once.
//!
//! Wire names are SCREAMING_SNAKE_CASE because they double as the vocabulary
//! the classification prompts teach the model; a mismatch between this module
//! and [`crate::prompts`] makes the model's output unparseable, so the enum
//! serde names are the single source of truth and the prompts interpolate
//! nothing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Financial institutions the classifier may attribute a statement to.
///
/// `Other` means "recognisably a bank, but not on this roster";
/// `Unidentified` means "no evidence at all". The two are distinct on
/// purpose — only `Unidentified` triggers the page-image fallback vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bank {
    BancoDoBrasil,
    CaixaEconomicaFederal,
    Itau,
    Bradesco,
    Santander,
    Nubank,
    Inter,
    BtgPactual,
    Safra,
    Sicredi,
    Sicoob,
    Original,
    C6Bank,
    Pagbank,
    Banrisul,
    MercantilDoBrasil,
    Pan,
    Bmg,
    Other,
    Unidentified,
}

/// Mechanism through which a transaction was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Pix,
    Transfer,
    Deposit,
    Withdrawal,
    CardPurchase,
    BillPayment,
    Reversal,
    Other,
}

/// Spending/receiving purpose bucket for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Housing,
    Food,
    Transport,
    Health,
    Education,
    Leisure,
    Taxes,
    PersonToPerson,
    Other,
}

/// A confidence-scored guess at the issuing bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankCandidate {
    pub bank: Bank,
    /// Model confidence in `[0, 1]`. The prompt instructs the model to stay
    /// at or below 0.8 unless the evidence is conclusive.
    pub score: f64,
}

impl BankCandidate {
    /// Whether this candidate can be accepted without the page-image vote.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.score > threshold && self.bank != Bank::Unidentified
    }

    /// A candidate carrying no evidence at all.
    pub fn unidentified() -> Self {
        Self {
            bank: Bank::Unidentified,
            score: 0.0,
        }
    }
}

/// One money movement inside a statement.
///
/// Sign convention: debits negative, credits positive — the sign mirrors the
/// statement text, so an amount printed without a minus is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: f64,
    pub date: NaiveDate,
    pub channel: Channel,
    pub category: Category,
}

/// One finalised bank statement: issuing-bank candidate, the ordered
/// transaction list, and the first day of the statement's month.
///
/// Produced once per uploaded document by [`crate::batch::format_batch`];
/// immutable after the bank candidate is settled. Statements cover a single
/// calendar month, so `statement_month` is the first-of-month date shared by
/// every transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub bank: BankCandidate,
    pub transactions: Vec<Transaction>,
    pub statement_month: NaiveDate,
}

impl Statement {
    /// Serialise to the dict-shaped record handed to the persistence
    /// collaborator. Owner/document keys are the caller's concern.
    pub fn to_record(&self) -> serde_json::Value {
        // Statement contains no map keys that can fail to serialise.
        serde_json::to_value(self).expect("statement record serialisation is infallible")
    }

    /// Rebuild a statement from a stored record.
    pub fn from_record(record: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_statement() -> Statement {
        Statement {
            bank: BankCandidate {
                bank: Bank::Nubank,
                score: 0.93,
            },
            transactions: vec![
                Transaction {
                    amount: -152.4,
                    date: date(2024, 3, 4),
                    channel: Channel::Pix,
                    category: Category::Food,
                },
                Transaction {
                    amount: 1200.0,
                    date: date(2024, 3, 12),
                    channel: Channel::Transfer,
                    category: Category::PersonToPerson,
                },
            ],
            statement_month: date(2024, 3, 1),
        }
    }

    #[test]
    fn bank_wire_names() {
        assert_eq!(
            serde_json::to_string(&Bank::BancoDoBrasil).unwrap(),
            "\"BANCO_DO_BRASIL\""
        );
        assert_eq!(serde_json::to_string(&Bank::C6Bank).unwrap(), "\"C6_BANK\"");
        assert_eq!(
            serde_json::to_string(&Bank::Unidentified).unwrap(),
            "\"UNIDENTIFIED\""
        );
        let back: Bank = serde_json::from_str("\"BTG_PACTUAL\"").unwrap();
        assert_eq!(back, Bank::BtgPactual);
    }

    #[test]
    fn channel_and_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&Channel::CardPurchase).unwrap(),
            "\"CARD_PURCHASE\""
        );
        assert_eq!(
            serde_json::to_string(&Category::PersonToPerson).unwrap(),
            "\"PERSON_TO_PERSON\""
        );
    }

    #[test]
    fn confidence_gate() {
        let strong = BankCandidate {
            bank: Bank::Itau,
            score: 0.95,
        };
        assert!(strong.is_confident(0.8));

        // Exactly at the threshold is not above it.
        let borderline = BankCandidate {
            bank: Bank::Itau,
            score: 0.8,
        };
        assert!(!borderline.is_confident(0.8));

        // A high score never rescues an unidentified bank.
        let unknown = BankCandidate {
            bank: Bank::Unidentified,
            score: 0.99,
        };
        assert!(!unknown.is_confident(0.8));
    }

    #[test]
    fn record_round_trip_preserves_statement() {
        let statement = sample_statement();
        let record = statement.to_record();

        // Dict shape the persistence layer expects.
        assert_eq!(record["bank"]["bank"], "NUBANK");
        assert_eq!(record["transactions"].as_array().unwrap().len(), 2);
        assert_eq!(record["statement_month"], "2024-03-01");

        let back = Statement::from_record(record).unwrap();
        assert_eq!(back, statement);
        assert_eq!(back.transactions[0].amount, -152.4);
        assert_eq!(back.transactions[0].category, Category::Food);
    }

    #[test]
    fn debit_sign_survives_serialisation() {
        let statement = sample_statement();
        let json = serde_json::to_string(&statement).unwrap();
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert!(back.transactions[0].amount < 0.0);
        assert!(back.transactions[1].amount >= 0.0);
    }
}
