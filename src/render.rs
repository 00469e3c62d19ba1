//! Draw contract
//!
//! The simulation hands the host a read-only [`Snapshot`] after every tick.
//! Renderers turn it into pixels (canvas, GPU) or text (headless runs); none
//! of them can touch session state. [`Hud`] is the shared, display-ready
//! digest of the numbers every renderer shows.

use crate::Rect;
use crate::sim::{GameKind, SessionPhase, Snapshot};

/// Something that draws a settled snapshot
pub trait Renderer {
    fn draw(&mut self, snapshot: &Snapshot<'_>);
}

/// Draws nothing; counts frames
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl Renderer for NullRenderer {
    fn draw(&mut self, _snapshot: &Snapshot<'_>) {
        self.frames += 1;
    }
}

/// Runner score as shown on screen: five digits, zero padded
pub fn format_score(score: u64) -> String {
    format!("{score:05}")
}

/// Quest wealth with the currency sign
pub fn format_wealth(wealth: u64) -> String {
    format!("¥{wealth}")
}

/// Display-ready HUD values for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    /// Main counter; None while blanked by a milestone flash
    pub score: Option<String>,
    pub best: String,
    pub lives: u8,
    pub max_lives: u8,
    /// "x1.5" style label, only while a multiplier applies
    pub combo: Option<String>,
    /// "Level 3 · ¥12 / ¥60"
    pub level: Option<String>,
    /// Centre-screen prompt for non-active phases
    pub overlay: Option<String>,
}

impl Hud {
    /// Build the HUD. `score_flash` false keeps the score steady
    /// (reduced motion).
    pub fn from_snapshot(kind: GameKind, snap: &Snapshot<'_>, score_flash: bool) -> Self {
        let visible = snap.score_visible || !score_flash;
        let (score, best) = match kind {
            GameKind::Runner => (format_score(snap.score), format!("HI {}", format_score(snap.best))),
            GameKind::Quest => (
                format_wealth(snap.wealth),
                format!("BEST {}", format_wealth(snap.best)),
            ),
        };

        let combo = (snap.multiplier > 1.0).then(|| format!("x{:.1}", snap.multiplier));
        let level = snap.level.map(|def| {
            format!(
                "Level {} · {} / {}",
                def.id,
                format_wealth(snap.wealth),
                format_wealth(def.target)
            )
        });

        Self {
            score: visible.then_some(score),
            best,
            lives: snap.lives,
            max_lives: snap.max_lives,
            combo,
            level,
            overlay: overlay_text(kind, snap),
        }
    }

    /// One-line rendering for logs and terminals
    pub fn line(&self) -> String {
        let mut parts = Vec::new();
        parts.push(self.score.clone().unwrap_or_default());
        parts.push(self.best.clone());
        parts.push(format!(
            "{}{}",
            "♥".repeat(self.lives as usize),
            "♡".repeat(self.max_lives.saturating_sub(self.lives) as usize)
        ));
        if let Some(combo) = &self.combo {
            parts.push(combo.clone());
        }
        if let Some(level) = &self.level {
            parts.push(level.clone());
        }
        if let Some(overlay) = &self.overlay {
            parts.push(format!("[{overlay}]"));
        }
        parts.join("  ")
    }
}

fn overlay_text(kind: GameKind, snap: &Snapshot<'_>) -> Option<String> {
    // Outcome prompts stay hidden until continue input is accepted
    let prompt = |text: &str| snap.can_continue.then(|| text.to_string());
    match (snap.phase, kind) {
        (SessionPhase::Active, _) => None,
        (SessionPhase::Menu, GameKind::Runner) => Some("Press SPACE to start".into()),
        (SessionPhase::Menu, GameKind::Quest) => Some("Drunkard's Quest - press SPACE".into()),
        (SessionPhase::Instructions, _) => {
            Some("Catch money, dodge bombs and bottles. SPACE to play".into())
        }
        (SessionPhase::LevelSelect, _) => Some(format!("Select level {}", snap.selected_level + 1)),
        (SessionPhase::Won, _) => prompt("Level cleared! SPACE for next level"),
        (SessionPhase::Lost, GameKind::Runner) => prompt("GAME OVER - SPACE to restart"),
        (SessionPhase::Lost, GameKind::Quest) => prompt("Broke! SPACE to try again"),
        (SessionPhase::Ending, _) => prompt("You made it home! SPACE for a new game"),
    }
}

/// World-space hitboxes of the player and every active entity
pub fn hitboxes(snap: &Snapshot<'_>) -> Vec<Rect> {
    std::iter::once(snap.player.hitbox())
        .chain(snap.entities.iter().filter(|e| e.is_active()).map(|e| e.hitbox()))
        .collect()
}

/// Headless renderer: keeps the latest HUD and the hitbox overlay
#[derive(Debug)]
pub struct TextRenderer {
    kind: GameKind,
    score_flash: bool,
    show_hitboxes: bool,
    pub hud: Option<Hud>,
    pub hitboxes: Vec<Rect>,
    pub frames: u64,
}

impl TextRenderer {
    pub fn new(kind: GameKind, score_flash: bool, show_hitboxes: bool) -> Self {
        Self {
            kind,
            score_flash,
            show_hitboxes,
            hud: None,
            hitboxes: Vec::new(),
            frames: 0,
        }
    }
}

impl Renderer for TextRenderer {
    fn draw(&mut self, snapshot: &Snapshot<'_>) {
        self.frames += 1;
        self.hud = Some(Hud::from_snapshot(self.kind, snapshot, self.score_flash));
        if self.show_hitboxes {
            self.hitboxes = hitboxes(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Ruleset, Session};

    #[test]
    fn test_score_formats() {
        assert_eq!(format_score(42), "00042");
        assert_eq!(format_score(123_456), "123456");
        assert_eq!(format_wealth(15), "¥15");
    }

    #[test]
    fn test_menu_hud() {
        let session = Session::new(Ruleset::runner(), 1).with_best(300);
        let hud = Hud::from_snapshot(GameKind::Runner, &session.snapshot(), true);
        assert_eq!(hud.score.as_deref(), Some("00000"));
        assert_eq!(hud.best, "HI 00300");
        assert_eq!(hud.overlay.as_deref(), Some("Press SPACE to start"));
        assert!(hud.combo.is_none());
        assert!(hud.level.is_none());
    }

    #[test]
    fn test_quest_hud_shows_level_progress() {
        let mut session = Session::new(Ruleset::quest(), 1);
        session.start();
        session.ledger.wealth = 7;
        let hud = Hud::from_snapshot(GameKind::Quest, &session.snapshot(), true);
        assert_eq!(hud.score.as_deref(), Some("¥7"));
        assert_eq!(hud.level.as_deref(), Some("Level 1 · ¥7 / ¥15"));
        assert!(hud.overlay.is_none());
        assert!(hud.line().contains("¥7"));
    }

    #[test]
    fn test_flash_hides_score_unless_reduced_motion() {
        let mut session = Session::new(Ruleset::runner(), 1);
        session.start();
        session.ledger.add_distance(100.0, 100);
        // Find a flash tick with the score blanked
        while session.ledger.score_visible() {
            session.ledger.tick_flash(1.0);
        }
        let snap = session.snapshot();
        assert!(Hud::from_snapshot(GameKind::Runner, &snap, true).score.is_none());
        assert!(Hud::from_snapshot(GameKind::Runner, &snap, false).score.is_some());
    }

    #[test]
    fn test_text_renderer_collects_hitboxes() {
        let session = Session::new(Ruleset::runner(), 1);
        let mut renderer = TextRenderer::new(GameKind::Runner, true, true);
        renderer.draw(&session.snapshot());
        assert_eq!(renderer.frames, 1);
        assert_eq!(renderer.hitboxes.len(), 1);
        assert!(renderer.hud.is_some());

        let mut null = NullRenderer::default();
        null.draw(&session.snapshot());
        assert_eq!(null.frames, 1);
    }
}
