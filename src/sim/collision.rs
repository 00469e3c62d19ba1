//! Player-versus-entity contact resolution
//!
//! Every active entity whose hitbox overlaps the player's is classified in a
//! fixed precedence order and consumed. The resolver mutates the player and
//! the ledger only; it reports outcome signals (lives exhausted, target
//! reached) and leaves phase changes to the session.

use glam::Vec2;

use super::entity::{ContactClass, Currency, Entity, EntityKind, Fate, HazardKind, PowerUpKind};
use super::ledger::Ledger;
use super::player::{Player, StatusKind};
use super::rules::ContactRules;

/// How one contact was resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Harm landed; a life was lost
    Damaged { lives_left: u8 },
    /// Harm converted to currency by invincibility or fortune
    Redirected { earned: u64 },
    /// Currency paid out with the streak multiplier applied
    Collected {
        currency: Currency,
        earned: u64,
        multiplier: f32,
    },
    /// One life restored
    Healed { lives: u8 },
    /// Health pickup at full lives, paid as currency instead
    HealConverted { earned: u64 },
    /// Timed power-up started
    PowerUp(PowerUpKind),
    /// Clear-screen swept every other active entity
    Cleared { count: u32, earned: u64 },
}

impl Outcome {
    pub fn is_beneficial(&self) -> bool {
        !matches!(self, Outcome::Damaged { .. })
    }
}

/// A resolved contact with the entity it consumed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub entity_id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub outcome: Outcome,
}

/// Everything that happened during one resolution pass
#[derive(Debug, Clone, Default)]
pub struct ContactReport {
    pub contacts: Vec<Contact>,
    /// The last life was lost this pass
    pub lives_exhausted: bool,
    /// Wealth reached the target after a beneficial contact
    pub target_reached: bool,
}

impl ContactReport {
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Status side effect of a hazard hit
fn hazard_effect(kind: HazardKind, rules: &ContactRules) -> (StatusKind, f32) {
    match kind {
        HazardKind::Bomb => (StatusKind::Stunned, rules.bomb_stun_ticks),
        HazardKind::Bottle => (StatusKind::Slowed, rules.bottle_slow_ticks),
    }
}

/// Resolve every overlap between the player and the active entities.
///
/// `target` is the wealth threshold of the current level, if any. Entities
/// are visited in slice order; processing stops once the last life is lost.
pub fn resolve_contacts(
    player: &mut Player,
    entities: &mut [Entity],
    ledger: &mut Ledger,
    rules: &ContactRules,
    target: Option<u64>,
) -> ContactReport {
    let mut report = ContactReport::default();
    if player.is_dead() {
        return report;
    }

    for i in 0..entities.len() {
        if !entities[i].is_active() || !player.hitbox().overlaps(&entities[i].hitbox()) {
            continue;
        }
        let kind = entities[i].kind;
        let pos = entities[i].pos;

        let outcome = match kind.class() {
            ContactClass::Harmful { salvage } => {
                if player.status.redirects_harm() {
                    ledger.credit(salvage as u64);
                    ledger.extend_streak();
                    Outcome::Redirected {
                        earned: salvage as u64,
                    }
                } else if player.status.in_grace() {
                    // Already hit this window; pass through untouched
                    continue;
                } else {
                    let lives_left = ledger.take_hit();
                    player.apply_status(StatusKind::Hurt, rules.hurt_ticks);
                    if let EntityKind::Hazard(hazard) = kind {
                        let (status, ticks) = hazard_effect(hazard, rules);
                        player.apply_status(status, ticks);
                    }
                    Outcome::Damaged { lives_left }
                }
            }
            ContactClass::Currency { value } => {
                let bonus = if player.status.is_active(StatusKind::Buffed) {
                    rules.buff_multiplier
                } else {
                    1.0
                };
                let earned = ledger.collect(value, bonus);
                let currency = match kind {
                    EntityKind::Currency(c) => c,
                    _ => Currency::Coin,
                };
                Outcome::Collected {
                    currency,
                    earned,
                    multiplier: ledger.multiplier(),
                }
            }
            ContactClass::Health => {
                ledger.extend_streak();
                if ledger.heal() {
                    Outcome::Healed {
                        lives: ledger.lives,
                    }
                } else {
                    let earned = rules.heart_bonus as u64;
                    ledger.credit(earned);
                    Outcome::HealConverted { earned }
                }
            }
            ContactClass::PowerUp(power) => {
                ledger.extend_streak();
                match power {
                    PowerUpKind::ClearScreen => {
                        entities[i].retire(Fate::Consumed);
                        let (count, earned) = sweep(entities, rules.heart_bonus);
                        ledger.credit(earned);
                        Outcome::Cleared { count, earned }
                    }
                    PowerUpKind::Invincibility => {
                        player.apply_status(StatusKind::Invincible, rules.invincible_ticks);
                        Outcome::PowerUp(power)
                    }
                    PowerUpKind::Fortune => {
                        player.apply_status(StatusKind::Buffed, rules.buff_ticks);
                        Outcome::PowerUp(power)
                    }
                }
            }
        };

        entities[i].retire(Fate::Consumed);
        log::debug!("contact #{} {:?}: {:?}", entities[i].id, kind, outcome);
        report.contacts.push(Contact {
            entity_id: entities[i].id,
            kind,
            pos,
            outcome,
        });

        if let Outcome::Damaged { lives_left: 0 } = outcome {
            report.lives_exhausted = true;
            break;
        }
        if outcome.is_beneficial() && target.is_some_and(|t| ledger.wealth >= t) {
            report.target_reached = true;
        }
    }

    report
}

/// Consume every active entity, returning how many and their total value
fn sweep(entities: &mut [Entity], heart_bonus: u32) -> (u32, u64) {
    let mut count = 0;
    let mut earned = 0u64;
    for entity in entities.iter_mut() {
        if entity.retire(Fate::Consumed) {
            count += 1;
            earned += entity.kind.conversion_value(heart_bonus) as u64;
        }
    }
    (count, earned)
}
