//! Bank disambiguation: a plurality vote over classified page images.
//!
//! Triggered only when the text extraction's bank candidate is weak — score
//! at or below the threshold, or `UNIDENTIFIED`. Each candidate image is
//! classified independently; weak per-image results count as abstentions and
//! the most common bank among the remaining votes wins. Ties break toward
//! the earliest-seen bank so the outcome is deterministic for a given
//! manifest order.
//!
//! When every vote is an abstention the statement keeps its original
//! candidate: a weak text-derived guess is still more evidence than three
//! unreadable crops.

use crate::config::PipelineConfig;
use crate::error::ExtratoError;
use crate::pipeline::images::{candidate_image_names, mime_for};
use crate::pipeline::llm::Classifier;
use crate::pipeline::parse::{JobId, ParseService};
use crate::schema::{Bank, Statement};
use tracing::{debug, info};

/// Resolve a weak bank candidate by voting over the job's page images.
///
/// Overwrites `statement.bank.bank` with the winning vote; the vote's own
/// confidence score is not carried into the statement. Leaves the statement
/// untouched when the job produced no images or no image yields a confident
/// vote.
pub async fn resolve_bank<P, C>(
    service: &P,
    classifier: &C,
    job: &JobId,
    statement: &mut Statement,
    config: &PipelineConfig,
) -> Result<(), ExtratoError>
where
    P: ParseService + ?Sized,
    C: Classifier + ?Sized,
{
    let names = candidate_image_names(service, job, config.max_vote_images).await?;
    if names.is_empty() {
        info!(
            "Job {}: no page images to vote on, keeping {:?}",
            job, statement.bank.bank
        );
        return Ok(());
    }

    let mut votes: Vec<Bank> = Vec::with_capacity(names.len());
    for name in &names {
        let bytes = service.page_image(job, name).await?;
        let candidate = classifier.classify_image(&bytes, mime_for(name)).await?;
        if candidate.is_confident(config.confidence_threshold) {
            debug!("Image '{}' votes {:?} ({:.2})", name, candidate.bank, candidate.score);
            votes.push(candidate.bank);
        } else {
            debug!(
                "Image '{}' abstains ({:?}, {:.2})",
                name, candidate.bank, candidate.score
            );
        }
    }

    match plurality(&votes) {
        Some(winner) => {
            info!(
                "Job {}: bank vote resolved {:?} → {:?} ({} of {} images voted)",
                job,
                statement.bank.bank,
                winner,
                votes.len(),
                names.len()
            );
            statement.bank.bank = winner;
        }
        None => {
            info!(
                "Job {}: all {} image votes abstained, keeping {:?}",
                job,
                names.len(),
                statement.bank.bank
            );
        }
    }

    Ok(())
}

/// Most common bank among `votes`; ties break toward the first-encountered
/// bank. `None` when there are no votes.
pub fn plurality(votes: &[Bank]) -> Option<Bank> {
    let mut tally: Vec<(Bank, usize)> = Vec::new();
    for vote in votes {
        match tally.iter_mut().find(|(bank, _)| bank == vote) {
            Some(entry) => entry.1 += 1,
            None => tally.push((*vote, 1)),
        }
    }

    let mut winner: Option<(Bank, usize)> = None;
    for (bank, count) in tally {
        // Strictly greater keeps the earliest bank on a tie.
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((bank, count));
        }
    }
    winner.map(|(bank, _)| bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plurality_picks_the_majority() {
        let votes = [Bank::Itau, Bank::Nubank, Bank::Itau];
        assert_eq!(plurality(&votes), Some(Bank::Itau));
    }

    #[test]
    fn plurality_tie_breaks_on_first_encountered() {
        let votes = [Bank::Bradesco, Bank::Santander, Bank::Santander, Bank::Bradesco];
        assert_eq!(plurality(&votes), Some(Bank::Bradesco));
    }

    #[test]
    fn plurality_of_nothing_is_none() {
        assert_eq!(plurality(&[]), None);
    }

    #[test]
    fn single_vote_wins() {
        assert_eq!(plurality(&[Bank::C6Bank]), Some(Bank::C6Bank));
    }
}
