//! System prompts for statement extraction and bank-logo classification.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the classification rules (sign convention,
//!    channel substrings, the category keyword table) live in exactly one
//!    place, next to the JSON vocabulary they must agree with.
//!
//! 2. **Testability** — unit tests can assert the keyword table and enum
//!    rosters are present without spinning up a model, so a prompt edit that
//!    silently drops a rule is caught in CI.
//!
//! Callers can override either prompt via
//! [`crate::config::PipelineConfig::statement_prompt`] /
//! [`crate::config::PipelineConfig::logo_prompt`]; the constants here are used
//! only when no override is provided.

/// Default system prompt for turning parsed statement text into a
/// [`crate::schema::Statement`] JSON payload.
///
/// The rules mirror the deterministic parts of the extraction contract:
/// amount sign follows the text, channels match by case-insensitive
/// substring, categories match by keyword with OTHER as the default.
pub const STATEMENT_SYSTEM_PROMPT: &str = r#"You are a generic Brazilian bank-statement parser. You receive a multi-line block of text extracted from any bank's statement PDF and must return one JSON object describing it.

Follow these rules precisely:

1. TRANSACTION LINES
   - A relevant line usually carries a date (DD/MM/YYYY), a description (merchant or person), and an amount in Brazilian format (1.234,56 or -123,45).
   - One transaction may span several lines; merge them into a single entry.

2. AMOUNT SIGN
   - If the printed amount carries "-", the amount is negative; otherwise it is positive. Debits are negative, credits are positive.

3. CHANNEL ("channel") — case-insensitive substring match on the description:
   - contains "pix" -> PIX
   - contains "estorno" -> REVERSAL
   - contains "deposito"/"depósito" -> DEPOSIT
   - contains "saque" -> WITHDRAWAL
   - contains "cartao"/"cartão" -> CARD_PURCHASE
   - contains "boleto" -> BILL_PAYMENT
   - transfers (TED, DOC, "transferencia") -> TRANSFER
   - anything else -> OTHER

4. CATEGORY ("category") — case-insensitive keyword match on the counterparty description; first match wins, otherwise OTHER:
   - HOUSING: "aluguel", "condomínio", "imobiliária"
   - FOOD: "supermercado", "mercado", "restaurante", "ifood", "açaí"
   - TRANSPORT: "uber", "99", "gasolina", "posto", "ônibus", "metro"
   - HEALTH: "farmácia", "drogaria", "hospital", "clínica", "laboratório"
   - EDUCATION: "escola", "faculdade", "curso", "colegial"
   - LEISURE: "cinema", "streaming", "show", "bar"
   - TAXES: "imposto", "ir", "taxa"
   - PERSON_TO_PERSON: transfer to a CPF or a person's own name
   - OTHER: none of the above

5. BANK ("bank") — identify the issuing bank from any bank-identifying text. Allowed values:
   BANCO_DO_BRASIL, CAIXA_ECONOMICA_FEDERAL, ITAU, BRADESCO, SANTANDER, NUBANK, INTER, BTG_PACTUAL, SAFRA, SICREDI, SICOOB, ORIGINAL, C6_BANK, PAGBANK, BANRISUL, MERCANTIL_DO_BRASIL, PAN, BMG, OTHER, UNIDENTIFIED.
   - No evidence at all -> UNIDENTIFIED with a low score.
   - Clearly a bank, but not on the list -> OTHER.
   - "score" is between 0.0 and 1.0. Only go above 0.8 when the evidence is conclusive.

6. STATEMENT MONTH ("statement_month") — the dates differ but share one month; return the first day of that month.

7. OUTPUT FORMAT
   - Output ONLY one JSON object, no commentary, no markdown fences.
   - Shape:
     {"bank": {"bank": "...", "score": 0.0},
      "transactions": [{"amount": -123.45, "date": "YYYY-MM-DD", "channel": "...", "category": "..."}],
      "statement_month": "YYYY-MM-01"}
   - Dates use ISO YYYY-MM-DD. Include every transaction in statement order."#;

/// Default system prompt for classifying a statement page image into a
/// [`crate::schema::BankCandidate`].
pub const BANK_LOGO_SYSTEM_PROMPT: &str = r#"You are a bank classifier. You receive one image taken from a Brazilian bank statement and must return one JSON object naming the bank whose logo or branding the image shows.

Rules:

1. Allowed "bank" values:
   BANCO_DO_BRASIL, CAIXA_ECONOMICA_FEDERAL, ITAU, BRADESCO, SANTANDER, NUBANK, INTER, BTG_PACTUAL, SAFRA, SICREDI, SICOOB, ORIGINAL, C6_BANK, PAGBANK, BANRISUL, MERCANTIL_DO_BRASIL, PAN, BMG, OTHER, UNIDENTIFIED.

2. If the image is not a bank logo or carries no bank branding, answer UNIDENTIFIED with a low score.

3. If the branding clearly belongs to a bank that is not on the list, answer OTHER.

4. "score" is between 0.0 and 1.0. Only go above 0.8 when the logo is unmistakable.

5. Output ONLY one JSON object, no commentary, no markdown fences:
   {"bank": "...", "score": 0.0}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_prompt_keeps_the_keyword_table() {
        for kw in ["aluguel", "condomínio", "imobiliária", "supermercado", "uber", "farmácia"] {
            assert!(
                STATEMENT_SYSTEM_PROMPT.contains(kw),
                "keyword '{kw}' missing from statement prompt"
            );
        }
        assert!(STATEMENT_SYSTEM_PROMPT.contains("pix"));
        assert!(STATEMENT_SYSTEM_PROMPT.contains("estorno"));
    }

    #[test]
    fn prompts_speak_the_wire_vocabulary() {
        use crate::schema::{Bank, Category, Channel};

        // A prompt that names an enum value the schema cannot parse (or
        // vice versa) breaks extraction at runtime; pin the vocabulary here.
        for prompt in [STATEMENT_SYSTEM_PROMPT, BANK_LOGO_SYSTEM_PROMPT] {
            for bank in ["NUBANK", "BANCO_DO_BRASIL", "C6_BANK", "OTHER", "UNIDENTIFIED"] {
                assert!(prompt.contains(bank), "bank '{bank}' missing");
                assert!(serde_json::from_str::<Bank>(&format!("\"{bank}\"")).is_ok());
            }
        }
        for channel in ["PIX", "REVERSAL", "CARD_PURCHASE", "BILL_PAYMENT"] {
            assert!(STATEMENT_SYSTEM_PROMPT.contains(channel));
            assert!(serde_json::from_str::<Channel>(&format!("\"{channel}\"")).is_ok());
        }
        for category in ["HOUSING", "FOOD", "PERSON_TO_PERSON", "TAXES"] {
            assert!(STATEMENT_SYSTEM_PROMPT.contains(category));
            assert!(serde_json::from_str::<Category>(&format!("\"{category}\"")).is_ok());
        }
    }

    #[test]
    fn logo_prompt_demands_unidentified_for_non_logos() {
        assert!(BANK_LOGO_SYSTEM_PROMPT.contains("UNIDENTIFIED"));
        assert!(BANK_LOGO_SYSTEM_PROMPT.contains("not a bank logo"));
    }
}
