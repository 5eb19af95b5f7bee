use tracing::{debug, info, trace, warn};

use crate::config::ParseError;
use crate::executor::synth::InputSynthesizer;
use crate::executor::translator::{self, ContactEvent, InputAction};
use crate::gamepad::geometry::{self, ScreenBounds};
use crate::gamepad::{ButtonId, GamepadModel};
use crate::host::Surface;

/// Whether the host should keep running after an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runtime is responsible for:
/// - owning the live gamepad model and its session state
/// - translating contact events and forwarding the actions to the synthesizer
/// - swapping in reloaded models with a full surface teardown/rebuild
///
/// All methods take `&mut self`; whoever owns the runtime is the single
/// serialized context in which input and reloads are applied.
pub struct Runtime<S, P> {
    gamepad: GamepadModel,
    screen: ScreenBounds,
    synth: S,
    surface: P,
}

impl<S: InputSynthesizer, P: Surface> Runtime<S, P> {
    /// Create a runtime and show the initial model.
    pub fn new(gamepad: GamepadModel, screen: ScreenBounds, synth: S, mut surface: P) -> Self {
        surface.build(&gamepad, screen);
        Self {
            gamepad,
            screen,
            synth,
            surface,
        }
    }

    pub fn gamepad(&self) -> &GamepadModel {
        &self.gamepad
    }

    pub fn screen(&self) -> ScreenBounds {
        self.screen
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    /// Screen bounds changed: rebuild the surfaces at their new positions.
    pub fn set_screen(&mut self, screen: ScreenBounds) {
        if screen == self.screen {
            return;
        }
        info!(
            target: "touchjoy::runtime",
            from = %self.screen, to = %screen,
            "Screen bounds changed"
        );
        self.surface.teardown();
        self.screen = screen;
        self.surface.build(&self.gamepad, screen);
    }

    /// Deliver a contact event to a button by name. Unknown names are ignored.
    pub fn contact_by_name(&mut self, name: &str, event: ContactEvent) -> Flow {
        match self.gamepad.find(name) {
            Some(id) => self.contact(id, event),
            None => {
                debug!(target: "touchjoy::runtime", button = %name, "Contact for unknown button");
                Flow::Continue
            }
        }
    }

    /// Deliver a contact event to a button.
    pub fn contact(&mut self, id: ButtonId, event: ContactEvent) -> Flow {
        let screen = self.screen;
        let Some(button) = self.gamepad.get_mut(id) else {
            debug!(target: "touchjoy::runtime", ?id, "Contact for stale button id");
            return Flow::Continue;
        };
        let rect = geometry::resolve(&button.placement, screen);
        let actions = translator::translate(button, rect, event);
        trace!(
            target: "touchjoy::runtime",
            button = %button.name, ?event, actions = actions.len(),
            "Translated contact"
        );
        self.perform(&actions)
    }

    fn perform(&mut self, actions: &[InputAction]) -> Flow {
        let mut flow = Flow::Continue;
        for action in actions {
            let result = match *action {
                InputAction::Press(code) => self.synth.press(code),
                InputAction::Release(code) => self.synth.release(code),
                InputAction::Scroll { x, y, amount } => self.synth.scroll(x, y, amount),
                InputAction::Terminate => {
                    self.synth.terminate();
                    flow = Flow::Quit;
                    Ok(())
                }
            };
            if let Err(err) = result {
                warn!(target: "touchjoy::runtime", ?action, error = %err, "Failed to synthesize input");
            }
        }
        flow
    }

    /// Release every key the live model still holds on the host: stick edges
    /// and latched sticky keys.
    pub fn release_all(&mut self) {
        let actions: Vec<_> = self
            .gamepad
            .buttons_mut()
            .flat_map(translator::release_held)
            .collect();
        if !actions.is_empty() {
            debug!(target: "touchjoy::runtime", released = actions.len(), "Releasing held keys");
        }
        self.perform(&actions);
    }

    /// Install a freshly loaded model: release what the old one holds, tear
    /// down the old surfaces, swap the model, build the new surfaces.
    pub fn install(&mut self, next: GamepadModel) {
        self.release_all();
        self.surface.teardown();
        self.gamepad.replace(next);
        self.surface.build(&self.gamepad, self.screen);
        info!(target: "touchjoy::runtime", buttons = self.gamepad.len(), "Gamepad reloaded");
    }

    /// Apply the outcome of a reload. On failure the diagnostic is reported
    /// and the current model stays active.
    pub fn apply_reload(&mut self, result: Result<GamepadModel, ParseError>) -> bool {
        match result {
            Ok(next) => {
                self.install(next);
                true
            }
            Err(err) => {
                warn!(
                    target: "touchjoy::runtime",
                    line = err.line, error = err.message(),
                    "Reload failed; keeping current layout"
                );
                self.surface.report("Error while reloading config", &err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;
    use crate::executor::synth::RecordingSynthesizer;
    use crate::executor::translator::LocalPoint;

    /// Surface that records the order of calls it receives.
    #[derive(Debug, Default)]
    struct RecordingSurface {
        calls: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn build(&mut self, model: &GamepadModel, _screen: ScreenBounds) {
            let names: Vec<_> = model.iter().map(|(_, b)| b.name.as_str()).collect();
            self.calls.push(format!("build {}", names.join(",")));
        }

        fn teardown(&mut self) {
            self.calls.push("teardown".into());
        }

        fn report(&mut self, _title: &str, error: &ParseError) {
            self.calls.push(format!("report {}", error.line));
        }
    }

    const LAYOUT: &str = "\
[jump]
type=key
keycode=32

[scroll]
type=wheel
direction=down
amount=3
x=100
y=200

[stick]
type=stick
keyup=1
keydown=2
keyleft=3
keyright=4

[quit]
type=quit
";

    fn runtime() -> Runtime<RecordingSynthesizer, RecordingSurface> {
        Runtime::new(
            load_from_str(LAYOUT).unwrap(),
            ScreenBounds::new(800, 600),
            RecordingSynthesizer::new(),
            RecordingSurface::default(),
        )
    }

    #[test]
    fn key_and_wheel_reach_the_synthesizer() {
        let mut rt = runtime();
        rt.contact_by_name("jump", ContactEvent::Down(None));
        rt.contact_by_name("jump", ContactEvent::Up);
        rt.contact_by_name("scroll", ContactEvent::Down(None));
        rt.contact_by_name("scroll", ContactEvent::Up);
        assert_eq!(
            rt.synth_mut().drain(),
            vec![
                InputAction::Press(32),
                InputAction::Release(32),
                InputAction::Scroll { x: 95, y: 195, amount: -3 },
            ]
        );
    }

    #[test]
    fn quit_tap_returns_quit_flow() {
        let mut rt = runtime();
        assert_eq!(rt.contact_by_name("quit", ContactEvent::Down(None)), Flow::Continue);
        assert_eq!(rt.contact_by_name("quit", ContactEvent::Up), Flow::Quit);
        assert_eq!(rt.synth().actions, vec![InputAction::Terminate]);
    }

    #[test]
    fn unknown_button_is_ignored() {
        let mut rt = runtime();
        assert_eq!(rt.contact_by_name("nope", ContactEvent::Up), Flow::Continue);
        assert!(rt.synth().actions.is_empty());
    }

    #[test]
    fn failed_reload_keeps_model_and_reports() {
        let mut rt = runtime();
        let before: Vec<_> = rt
            .gamepad()
            .iter()
            .map(|(_, b)| geometry::resolve(&b.placement, rt.screen()))
            .collect();

        let applied = rt.apply_reload(load_from_str("[a]\nx=1\nthis line is broken\n"));
        assert!(!applied);
        assert_eq!(rt.gamepad().len(), 4);
        let after: Vec<_> = rt
            .gamepad()
            .iter()
            .map(|(_, b)| geometry::resolve(&b.placement, rt.screen()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(rt.surface().calls, ["build jump,scroll,stick,quit", "report 3"]);
    }

    #[test]
    fn successful_reload_tears_down_before_building() {
        let mut rt = runtime();
        assert!(rt.apply_reload(load_from_str("[only]\ntype=quit\n")));
        assert_eq!(
            rt.surface().calls,
            ["build jump,scroll,stick,quit", "teardown", "build only"]
        );
        assert_eq!(rt.gamepad().len(), 1);
    }

    #[test]
    fn reload_releases_held_stick_edges() {
        let mut rt = runtime();
        // Give the stick a size so it can deflect.
        let mut sized = load_from_str(LAYOUT).unwrap();
        let id = sized.find("stick").unwrap();
        sized[id].placement.width = 100;
        sized[id].placement.height = 100;
        rt.install(sized.clone());

        rt.contact_by_name("stick", ContactEvent::Move(LocalPoint::new(90, 50)));
        assert_eq!(rt.synth_mut().drain(), vec![InputAction::Press(4)]);

        rt.install(sized);
        assert_eq!(rt.synth_mut().drain(), vec![InputAction::Release(4)]);
        // Fresh model: the same move presses again.
        rt.contact_by_name("stick", ContactEvent::Move(LocalPoint::new(90, 50)));
        assert_eq!(rt.synth_mut().drain(), vec![InputAction::Press(4)]);
    }

    #[test]
    fn screen_change_rebuilds_and_moves_wheel_cursor() {
        let mut rt = runtime();
        let mut model =
            load_from_str("[w]\ntype=wheel\ndirection=up\nright=10\nbottom=10\n").unwrap();
        let id = model.find("w").unwrap();
        model[id].placement.width = 20;
        model[id].placement.height = 20;
        rt.install(model);

        rt.set_screen(ScreenBounds::new(1000, 500));
        rt.contact_by_name("w", ContactEvent::Up);
        assert_eq!(
            rt.synth_mut().drain(),
            vec![InputAction::Scroll { x: 965, y: 465, amount: 1 }]
        );
        assert_eq!(rt.surface().calls.last().map(String::as_str), Some("build w"));
    }

    #[test]
    fn release_all_lets_go_of_latched_sticky_keys() {
        let mut rt = runtime();
        rt.install(load_from_str("[shift]\ntype=key\nkeycode=16\nsticky=yes\n").unwrap());
        rt.contact_by_name("shift", ContactEvent::Down(None));
        rt.contact_by_name("shift", ContactEvent::Up);
        assert_eq!(rt.synth_mut().drain(), vec![InputAction::Press(16)]);

        rt.release_all();
        assert_eq!(rt.synth_mut().drain(), vec![InputAction::Release(16)]);
        rt.release_all();
        assert!(rt.synth().actions.is_empty());
    }
}
