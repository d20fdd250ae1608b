//! Zusammensetzen von Tastenfolgen zu Press/Release-Aktionen
//!
//! Eine Tastenliste wie `[Ctrl, Alt, K]` wird als Akkord gespielt: Modifier werden
//! gedrückt und gehalten, jede normale Taste wird gedrückt und sofort losgelassen,
//! danach werden alle gehaltenen Modifier freigegeben. Am Ende der Liste noch
//! gehaltene Modifier werden ebenfalls freigegeben.

use crate::emitter::{EmitterError, KeyEmitter};
use crate::mapping::keys::KeyCode;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Eine einzelne Aktion für den Key-Emitter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Press(KeyCode),
    Release(KeyCode),
}

impl KeyAction {
    pub fn key(&self) -> KeyCode {
        match *self {
            KeyAction::Press(key) | KeyAction::Release(key) => key,
        }
    }
}

/// Berechnet die Aktionsfolge eines Akkords, ohne etwas auszugeben
pub fn plan_chord(keys: &[KeyCode]) -> Vec<KeyAction> {
    let mut actions = Vec::with_capacity(keys.len() * 2);
    let mut held: Vec<KeyCode> = Vec::new();

    for &key in keys {
        if key.is_modifier() {
            if !held.contains(&key) {
                actions.push(KeyAction::Press(key));
                held.push(key);
            }
        } else {
            actions.push(KeyAction::Press(key));
            actions.push(KeyAction::Release(key));
            actions.extend(held.drain(..).rev().map(KeyAction::Release));
        }
    }

    // Liste endete ohne normale Taste
    actions.extend(held.drain(..).rev().map(KeyAction::Release));
    actions
}

/// Zählt, wie viele Hold-Buttons eine Taste gerade gedrückt halten.
///
/// Eine Taste geht beim ersten Halter runter und erst beim letzten wieder hoch.
#[derive(Debug, Default)]
pub struct HeldKeys {
    counts: BTreeMap<KeyCode, usize>,
}

impl HeldKeys {
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.counts.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    // true, wenn die Taste vorher von niemandem gehalten wurde
    fn acquire(&mut self, key: KeyCode) -> bool {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count == 1
    }

    // true, wenn der letzte Halter losgelassen hat
    fn release(&mut self, key: KeyCode) -> bool {
        match self.counts.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(&key);
                true
            }
            None => false,
        }
    }
}

/// Spielt einen Akkord über den Emitter ab.
///
/// Tasten, die ein Hold-Button gerade hält, werden weder gedrückt noch
/// losgelassen. Schlägt eine Ausgabe fehl, werden alle bis dahin gedrückten
/// Tasten nach bestem Bemühen wieder losgelassen und der ursprüngliche Fehler
/// zurückgegeben.
pub fn emit_chord(
    keys: &[KeyCode],
    held: &HeldKeys,
    emitter: &mut dyn KeyEmitter,
) -> Result<(), EmitterError> {
    let mut down: Vec<KeyCode> = Vec::new();

    for action in plan_chord(keys) {
        if held.is_held(action.key()) {
            debug!("Skipping {:?}, key is held by a hold button", action);
            continue;
        }
        debug!("Chord action: {:?}", action);
        let result = match action {
            KeyAction::Press(key) => emitter.press_key(key).map(|_| down.push(key)),
            KeyAction::Release(key) => emitter
                .release_key(key)
                .map(|_| down.retain(|held| *held != key)),
        };

        if let Err(e) = result {
            release_all(&down, emitter);
            return Err(e);
        }
    }

    Ok(())
}

/// Drückt alle Tasten in Reihenfolge und lässt sie gedrückt (Hold-Modus).
/// Bereits gehaltene Tasten werden nur mitgezählt.
pub fn press_held(
    keys: &[KeyCode],
    held: &mut HeldKeys,
    emitter: &mut dyn KeyEmitter,
) -> Result<(), EmitterError> {
    for (pressed, &key) in keys.iter().enumerate() {
        if !held.acquire(key) {
            continue;
        }
        if let Err(e) = emitter.press_key(key) {
            held.release(key);
            if let Err(release_error) = release_held(&keys[..pressed], held, emitter) {
                warn!("Failed to undo hold after emission error: {}", release_error);
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Gibt die Tasten eines Hold-Buttons in umgekehrter Reihenfolge frei.
/// Losgelassen wird nur, was kein anderer Hold-Button mehr hält.
pub fn release_held(
    keys: &[KeyCode],
    held: &mut HeldKeys,
    emitter: &mut dyn KeyEmitter,
) -> Result<(), EmitterError> {
    let mut first_error = None;
    for &key in keys.iter().rev() {
        if !held.release(key) {
            continue;
        }
        if let Err(e) = emitter.release_key(key) {
            warn!("Failed to release key {}: {}", key, e);
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn release_all(keys: &[KeyCode], emitter: &mut dyn KeyEmitter) {
    for &key in keys.iter().rev() {
        if let Err(e) = emitter.release_key(key) {
            warn!("Failed to release key {} after emission error: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEmitter;
    use KeyAction::{Press, Release};

    const SHIFT: KeyCode = KeyCode::SHIFT;
    const CTRL: KeyCode = KeyCode::CONTROL;
    const ALT: KeyCode = KeyCode::ALT;
    const A: KeyCode = KeyCode(0x41);
    const B: KeyCode = KeyCode(0x42);
    const K: KeyCode = KeyCode(0x4B);

    #[test]
    fn shift_a_round_trip() {
        assert_eq!(
            plan_chord(&[SHIFT, A]),
            vec![Press(SHIFT), Press(A), Release(A), Release(SHIFT)]
        );
    }

    #[test]
    fn modifiers_wrap_the_following_key() {
        let actions = plan_chord(&[CTRL, ALT, K]);
        assert_eq!(
            actions,
            vec![
                Press(CTRL),
                Press(ALT),
                Press(K),
                Release(K),
                Release(ALT),
                Release(CTRL),
            ]
        );
    }

    #[test]
    fn k_modifiers_then_one_key_shape() {
        let modifiers = [
            KeyCode::LEFT_SHIFT,
            KeyCode::LEFT_CONTROL,
            KeyCode::LEFT_ALT,
            KeyCode::LEFT_SUPER,
        ];
        for count in 0..=modifiers.len() {
            let mut keys = modifiers[..count].to_vec();
            keys.push(A);
            let actions = plan_chord(&keys);

            assert_eq!(actions.len(), 2 * count + 2);
            assert!(actions[..count]
                .iter()
                .all(|a| matches!(a, Press(k) if k.is_modifier())));
            assert_eq!(actions[count], Press(A));
            assert_eq!(actions[count + 1], Release(A));
            assert!(actions[count + 2..]
                .iter()
                .all(|a| matches!(a, Release(k) if k.is_modifier())));
        }
    }

    #[test]
    fn modifiers_are_scoped_to_the_next_key_only() {
        assert_eq!(
            plan_chord(&[SHIFT, A, B]),
            vec![
                Press(SHIFT),
                Press(A),
                Release(A),
                Release(SHIFT),
                Press(B),
                Release(B),
            ]
        );
    }

    #[test]
    fn trailing_modifier_is_flushed() {
        assert_eq!(
            plan_chord(&[A, CTRL]),
            vec![Press(A), Release(A), Press(CTRL), Release(CTRL)]
        );
        assert_eq!(plan_chord(&[ALT]), vec![Press(ALT), Release(ALT)]);
    }

    #[test]
    fn repeated_modifier_is_pressed_once() {
        assert_eq!(
            plan_chord(&[SHIFT, SHIFT, A]),
            vec![Press(SHIFT), Press(A), Release(A), Release(SHIFT)]
        );
    }

    #[test]
    fn every_press_has_exactly_one_release() {
        let keys = [CTRL, SHIFT, A, ALT, B, SHIFT, CTRL, K, ALT];
        let actions = plan_chord(&keys);

        let mut down: Vec<KeyCode> = Vec::new();
        for action in actions {
            match action {
                Press(k) => {
                    assert!(!down.contains(&k), "{k} pressed twice");
                    down.push(k);
                }
                Release(k) => {
                    let before = down.len();
                    down.retain(|d| *d != k);
                    assert_eq!(down.len() + 1, before, "{k} released while up");
                }
            }
        }
        assert!(down.is_empty());
    }

    #[test]
    fn empty_list_emits_nothing() {
        assert!(plan_chord(&[]).is_empty());
    }

    #[test]
    fn emit_chord_forwards_the_plan() {
        let mut emitter = RecordingEmitter::default();
        emit_chord(&[SHIFT, A], &HeldKeys::default(), &mut emitter).unwrap();
        assert_eq!(
            emitter.actions(),
            vec![Press(SHIFT), Press(A), Release(A), Release(SHIFT)]
        );
    }

    #[test]
    fn failed_emission_releases_what_is_down() {
        let mut emitter = RecordingEmitter::failing_on(Press(A));
        let err = emit_chord(&[CTRL, SHIFT, A], &HeldKeys::default(), &mut emitter).unwrap_err();

        assert!(matches!(err, EmitterError::UnmappedKey(k) if k == A));
        assert_eq!(
            emitter.actions(),
            vec![Press(CTRL), Press(SHIFT), Release(SHIFT), Release(CTRL)]
        );
    }

    #[test]
    fn hold_presses_in_order_and_releases_in_reverse() {
        let mut emitter = RecordingEmitter::default();
        let mut held = HeldKeys::default();
        press_held(&[SHIFT, A], &mut held, &mut emitter).unwrap();
        release_held(&[SHIFT, A], &mut held, &mut emitter).unwrap();
        assert_eq!(
            emitter.actions(),
            vec![Press(SHIFT), Press(A), Release(A), Release(SHIFT)]
        );
        assert!(held.is_empty());
    }

    #[test]
    fn chord_leaves_keys_of_hold_buttons_alone() {
        let mut emitter = RecordingEmitter::default();
        let mut held = HeldKeys::default();
        press_held(&[KeyCode::LEFT_SHIFT], &mut held, &mut emitter).unwrap();

        emit_chord(&[KeyCode::LEFT_SHIFT, A], &held, &mut emitter).unwrap();
        assert_eq!(
            emitter.actions(),
            vec![Press(KeyCode::LEFT_SHIFT), Press(A), Release(A)]
        );
        assert!(held.is_held(KeyCode::LEFT_SHIFT));
    }

    #[test]
    fn shared_key_stays_down_until_last_holder_releases() {
        let mut emitter = RecordingEmitter::default();
        let mut held = HeldKeys::default();

        press_held(&[SHIFT], &mut held, &mut emitter).unwrap();
        press_held(&[SHIFT, B], &mut held, &mut emitter).unwrap();
        release_held(&[SHIFT], &mut held, &mut emitter).unwrap();
        assert_eq!(emitter.actions(), vec![Press(SHIFT), Press(B)]);

        release_held(&[SHIFT, B], &mut held, &mut emitter).unwrap();
        assert_eq!(
            emitter.actions(),
            vec![Press(SHIFT), Press(B), Release(B), Release(SHIFT)]
        );
        assert!(held.is_empty());
    }

    #[test]
    fn failed_hold_press_undoes_its_own_keys_only() {
        let mut emitter = RecordingEmitter::failing_on(Press(B));
        let mut held = HeldKeys::default();
        press_held(&[SHIFT], &mut held, &mut emitter).unwrap();

        let err = press_held(&[CTRL, SHIFT, B], &mut held, &mut emitter).unwrap_err();
        assert!(matches!(err, EmitterError::UnmappedKey(k) if k == B));
        assert_eq!(
            emitter.actions(),
            vec![Press(SHIFT), Press(CTRL), Release(CTRL)]
        );
        assert!(held.is_held(SHIFT));
        assert!(!held.is_held(CTRL));
    }
}
