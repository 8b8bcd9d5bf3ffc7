// SPDX-License-Identifier: GPL-3.0-only

//! Replays a scripted input session against the headless stage.
//!
//! A scenario describes an element tree, the coordinators living on it and a list of
//! steps. Every step produces report lines, which makes it easy to check how a given
//! sequence of clicks and key presses is resolved.

use std::{cell::RefCell, fs, path::Path, rc::Rc};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    backend::{headless::HeadlessStage, SceneGraph},
    config::Config,
    input::InputEvent,
    shell::{
        grabs::{CaptureRegistry, GrabContext, GrabCoordinator, GrabParams, UngrabParams},
        ElementId,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub id: ElementId,
    #[serde(default)]
    pub parent: Option<ElementId>,
    #[serde(default)]
    pub focusable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorSpec {
    pub name: String,
    pub owner: ElementId,
}

#[derive(Debug, Clone, Deserialize)]
pub enum Step {
    AddActor {
        coordinator: String,
        element: ElementId,
    },
    RemoveActor {
        coordinator: String,
        element: ElementId,
    },
    Grab {
        coordinator: String,
        target: ElementId,
        #[serde(default)]
        focus: Option<ElementId>,
    },
    Ungrab {
        coordinator: String,
        #[serde(default)]
        target: Option<ElementId>,
        #[serde(default)]
        user: bool,
    },
    IgnoreNextRelease {
        coordinator: String,
    },
    Event(InputEvent),
    Destroy(ElementId),
    Focus(Option<ElementId>),
    DenyModal(bool),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub focus: Option<ElementId>,
    #[serde(default)]
    pub deny_modal: bool,
    pub coordinators: Vec<CoordinatorSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_ron(content: &str) -> Result<Scenario> {
        ron::from_str(content).context("Malformed scenario")
    }

    pub fn load(path: &Path) -> Result<Scenario> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Scenario::from_ron(&content)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("unknown coordinator {0:?}")]
    UnknownCoordinator(String),
    #[error("coordinator {0:?} is declared twice")]
    DuplicateCoordinator(String),
}

type Report = Rc<RefCell<Vec<String>>>;

fn display(element: Option<ElementId>) -> String {
    element.map_or_else(|| String::from("none"), |element| element.to_string())
}

struct Replay {
    stage: Rc<HeadlessStage>,
    coordinators: IndexMap<String, Rc<GrabCoordinator>>,
    report: Report,
}

impl Replay {
    fn new(scenario: &Scenario, config: &Config) -> Result<Replay> {
        let stage = HeadlessStage::new();
        for element in &scenario.elements {
            stage.add_element(element.id, element.parent);
            stage.set_focusable(element.id, element.focusable);
        }
        stage.set_key_focus(scenario.focus);
        stage.set_deny_modal(scenario.deny_modal);

        let registry = CaptureRegistry::new(stage.clone());
        let ctx = GrabContext::new(stage.clone(), stage.clone(), registry)
            .with_keyboard(stage.clone());

        let mut coordinators = IndexMap::new();
        for spec in &scenario.coordinators {
            let coordinator = GrabCoordinator::with_options(
                spec.owner,
                ctx.clone(),
                config.coordinator_options(),
            );
            if coordinators.insert(spec.name.clone(), coordinator).is_some() {
                return Err(ReplayError::DuplicateCoordinator(spec.name.clone()).into());
            }
        }

        Ok(Replay {
            stage,
            coordinators,
            report: Rc::new(RefCell::new(Vec::new())),
        })
    }

    fn coordinator(&self, name: &str) -> Result<&Rc<GrabCoordinator>, ReplayError> {
        self.coordinators
            .get(name)
            .ok_or_else(|| ReplayError::UnknownCoordinator(name.to_owned()))
    }

    fn push(&self, line: String) {
        self.report.borrow_mut().push(line);
    }

    fn step(&self, step: &Step) -> Result<()> {
        debug!(?step, "Replaying step");
        match step {
            Step::AddActor {
                coordinator,
                element,
            } => {
                self.coordinator(coordinator)?.add_actor(*element);
                self.push(format!("{coordinator}: permit {element}"));
            }
            Step::RemoveActor {
                coordinator,
                element,
            } => {
                self.coordinator(coordinator)?.remove_actor(*element);
                self.push(format!("{coordinator}: unpermit {element}"));
            }
            Step::Grab {
                coordinator: name,
                target,
                focus,
            } => {
                let coordinator = self.coordinator(name)?;
                let report = self.report.clone();
                let released = format!("{name}: released {target}");
                let mut params = GrabParams::new(*target).on_release(move |user_initiated| {
                    report
                        .borrow_mut()
                        .push(format!("{released} (user: {user_initiated})"));
                });
                if let Some(focus) = focus {
                    params = params.focus(*focus);
                }
                match coordinator.grab(params) {
                    Ok(()) => self.push(format!("{name}: grab {target} ok")),
                    Err(err) => self.push(format!("{name}: grab {target} failed: {err}")),
                }
            }
            Step::Ungrab {
                coordinator,
                target,
                user,
            } => {
                let params = UngrabParams {
                    target: *target,
                    user_initiated: *user,
                };
                self.push(format!("{coordinator}: ungrab {}", display(*target)));
                self.coordinator(coordinator)?.ungrab(params);
            }
            Step::IgnoreNextRelease { coordinator } => {
                self.coordinator(coordinator)?.ignore_next_release();
                self.push(format!("{coordinator}: ignore next release"));
            }
            Step::Event(event) => {
                // release callbacks fire while the event is delivered, keep their lines after this one
                let index = self.report.borrow().len();
                let verdict = self.stage.deliver(event);
                self.report.borrow_mut().insert(
                    index,
                    format!(
                        "event {:?} on {}: {:?}",
                        event.kind,
                        display(event.source),
                        verdict
                    ),
                );
            }
            Step::Destroy(element) => {
                self.push(format!("destroy {element}"));
                self.stage.destroy(*element);
            }
            Step::Focus(element) => {
                self.stage.set_key_focus(*element);
                self.push(format!("focus {}", display(*element)));
            }
            Step::DenyModal(deny) => {
                self.stage.set_deny_modal(*deny);
                self.push(format!("deny modal: {deny}"));
            }
        }
        Ok(())
    }

    fn summary(&self) {
        self.push(format!("final focus: {}", display(self.stage.key_focus())));
        for (name, coordinator) in &self.coordinators {
            self.push(format!(
                "{name}: depth {}, current {}",
                coordinator.grab_stack_depth(),
                display(coordinator.current_grab_target())
            ));
        }
    }
}

/// Replays `scenario` and returns the report, one line per observation.
pub fn run(scenario: &Scenario, config: &Config) -> Result<Vec<String>> {
    let replay = Replay::new(scenario, config)?;
    info!(
        elements = scenario.elements.len(),
        coordinators = replay.coordinators.len(),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    for (index, step) in scenario.steps.iter().enumerate() {
        replay
            .step(step)
            .with_context(|| format!("Step {} failed", index + 1))?;
    }
    replay.summary();

    let lines = replay.report.borrow().clone();
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"(
        elements: [
            (id: 1),
            (id: 10, parent: Some(1)),
            (id: 11, parent: Some(10), focusable: true),
            (id: 20, parent: Some(1)),
            (id: 21, parent: Some(20), focusable: true),
            (id: 30, parent: Some(1)),
            (id: 31, parent: Some(30), focusable: true),
        ],
        focus: Some(11),
        coordinators: [(name: "panel", owner: 10)],
        steps: [
            AddActor(coordinator: "panel", element: 10),
            Grab(coordinator: "panel", target: 20),
            Grab(coordinator: "panel", target: 30),
            Event((kind: ButtonPress, source: Some(21))),
            Event((kind: ButtonRelease, source: Some(21))),
            Event((kind: KeyPress(65307))),
        ],
    )"#;

    #[test]
    fn replays_menu_session() {
        let scenario = Scenario::from_ron(SCENARIO).unwrap();
        let lines = run(&scenario, &Config::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                "panel: permit #10",
                "panel: grab #20 ok",
                "panel: grab #30 ok",
                "event ButtonPress on #21: Stop",
                "panel: released #30 (user: true)",
                "event ButtonRelease on #21: Stop",
                "event KeyPress(Keysym(65307)) on none: Stop",
                "panel: released #20 (user: true)",
                "final focus: #11",
                "panel: depth 0, current none",
            ]
        );
    }

    #[test]
    fn denied_modal_is_reported() {
        let scenario = Scenario::from_ron(
            r#"(
                elements: [(id: 1), (id: 2, parent: Some(1))],
                deny_modal: true,
                coordinators: [(name: "dialog", owner: 1)],
                steps: [
                    Grab(coordinator: "dialog", target: 2),
                    DenyModal(false),
                    Grab(coordinator: "dialog", target: 2),
                ],
            )"#,
        )
        .unwrap();
        let lines = run(&scenario, &Config::default()).unwrap();
        assert!(lines[0].starts_with("dialog: grab #2 failed"));
        assert_eq!(lines[2], "dialog: grab #2 ok");
        assert_eq!(lines.last().unwrap(), "dialog: depth 1, current #2");
    }

    #[test]
    fn unknown_coordinator_fails() {
        let scenario = Scenario::from_ron(
            r#"(coordinators: [], steps: [IgnoreNextRelease(coordinator: "nope")])"#,
        )
        .unwrap();
        let err = run(&scenario, &Config::default()).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<ReplayError>(),
            Some(ReplayError::UnknownCoordinator(name)) if name == "nope"
        ));
    }

    #[test]
    fn duplicate_coordinator_fails() {
        let scenario = Scenario::from_ron(
            r#"(coordinators: [(name: "a", owner: 1), (name: "a", owner: 2)])"#,
        )
        .unwrap();
        assert!(run(&scenario, &Config::default()).is_err());
    }

    #[test]
    fn destroyed_permitted_element_is_forgotten() {
        let scenario = Scenario::from_ron(
            r#"(
                elements: [(id: 1), (id: 2, parent: Some(1)), (id: 3, parent: Some(1))],
                coordinators: [(name: "menu", owner: 1)],
                steps: [
                    AddActor(coordinator: "menu", element: 2),
                    Grab(coordinator: "menu", target: 3),
                    Destroy(2),
                    Event((kind: ButtonPress, source: Some(1))),
                ],
            )"#,
        )
        .unwrap();
        let lines = run(&scenario, &Config::default()).unwrap();
        assert!(lines.contains(&String::from("menu: released #3 (user: true)")));
    }
}
