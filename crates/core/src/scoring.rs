use crate::Lead;

/// Acquisition channels that earn the channel bonus.
pub const BONUS_CHANNELS: &[&str] = &["Referido", "Facebook", "Google", "WhatsApp"];

pub const MAX_SCORE: u8 = 100;

/// Additive engagement score. Expects `age_years` to be current.
///
/// Rules (independent, clamped to 100):
/// - acquisition channel in [`BONUS_CHANNELS`] => +10
/// - stage is SQL or Demo_Booked => +20
/// - parsed age within 25..=45 => +10
/// - owner assigned => +5
pub fn lead_score(lead: &Lead) -> u8 {
    let mut score = 0u32;
    if BONUS_CHANNELS.contains(&lead.channel.as_str()) {
        score += 10;
    }
    if lead.stage.is_hot() {
        score += 20;
    }
    if (25..=45).contains(&lead.age_years) {
        score += 10;
    }
    if lead.has_owner() {
        score += 5;
    }
    score.min(u32::from(MAX_SCORE)) as u8
}
