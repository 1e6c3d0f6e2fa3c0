//! Lowering: description AST to the ordered declaration event stream.
//!
//! Events are grouped by kind so that a state may reference states and
//! events declared further down the file, while ordinals still follow the
//! order of `state` / `event` items:
//!
//! 1. `DeclareState` for every state
//! 2. `DeclareEvent` for every event
//! 3. `SetConfig` for every option
//! 4. `DeclareTransition` for every edge
//! 5. `DeclareInitial` for `initial-state` items and `initial` flags
//! 6. precondition / callback attachments
//!
//! Within each group, source order is preserved.

use cfsm_types::ast::*;
use cfsm_types::{Decl, DeclKind, HookTarget};

#[derive(Default)]
struct Lowered {
    states: Vec<Decl>,
    events: Vec<Decl>,
    config: Vec<Decl>,
    transitions: Vec<Decl>,
    initials: Vec<Decl>,
    hooks: Vec<Decl>,
}

impl Lowered {
    fn into_decls(self) -> Vec<Decl> {
        let mut decls = self.states;
        decls.extend(self.events);
        decls.extend(self.config);
        decls.extend(self.transitions);
        decls.extend(self.initials);
        decls.extend(self.hooks);
        decls
    }

    fn preconditions(&mut self, target: &HookTarget, names: &[Ident]) {
        for name in names {
            self.hooks.push(Decl::new(
                DeclKind::AttachPrecondition {
                    target: target.clone(),
                    name: name.name.clone(),
                },
                name.span,
            ));
        }
    }

    fn callbacks(&mut self, target: &HookTarget, names: &[Ident]) {
        for name in names {
            self.hooks.push(Decl::new(
                DeclKind::AttachCallback {
                    target: target.clone(),
                    name: name.name.clone(),
                },
                name.span,
            ));
        }
    }
}

/// Lower a parsed description into declaration events.
pub fn lower(description: &Description) -> Vec<Decl> {
    let mut out = Lowered::default();
    for item in &description.items {
        match item {
            Item::Option(opt) => out.config.push(Decl::new(
                DeclKind::SetConfig {
                    key: opt.key.name.replace('-', "_"),
                    value: opt.value.clone(),
                },
                opt.span,
            )),
            Item::Initial(init) => {
                for state in &init.states {
                    out.initials.push(Decl::new(
                        DeclKind::DeclareInitial {
                            state: state.name.clone(),
                        },
                        state.span,
                    ));
                }
            }
            Item::Event(event) => lower_event(event, &mut out),
            Item::State(state) => lower_state(state, &mut out),
        }
    }
    out.into_decls()
}

fn lower_event(event: &EventDecl, out: &mut Lowered) {
    out.events.push(Decl::new(
        DeclKind::DeclareEvent {
            name: event.name.name.clone(),
        },
        event.name.span,
    ));
    let target = HookTarget::Event(event.name.name.clone());
    out.preconditions(&target, &event.preconditions);
    out.callbacks(&target, &event.callbacks);
}

fn lower_state(state: &StateDecl, out: &mut Lowered) {
    let name = &state.name.name;
    out.states.push(Decl::new(
        DeclKind::DeclareState { name: name.clone() },
        state.name.span,
    ));
    if state.initial {
        out.initials.push(Decl::new(
            DeclKind::DeclareInitial {
                state: name.clone(),
            },
            state.name.span,
        ));
    }

    let entry = HookTarget::StateEntry(name.clone());
    let exit = HookTarget::StateExit(name.clone());
    for item in &state.body {
        match item {
            StateItem::EntryPrecondition(ids) => out.preconditions(&entry, ids),
            StateItem::ExitPrecondition(ids) => out.preconditions(&exit, ids),
            StateItem::OnEnter(ids) => out.callbacks(&entry, ids),
            StateItem::OnExit(ids) => out.callbacks(&exit, ids),
            StateItem::NextState(edges) => {
                for target in &edges.targets {
                    out.transitions.push(Decl::new(
                        DeclKind::DeclareTransition {
                            from: name.clone(),
                            event: None,
                            to: target.name.clone(),
                        },
                        target.span,
                    ));
                    let via = HookTarget::Transition {
                        from: name.clone(),
                        via: target.name.clone(),
                    };
                    out.preconditions(&via, &edges.preconditions);
                }
            }
            StateItem::OnEvent { event, edge } => {
                for target in &edge.targets {
                    out.transitions.push(Decl::new(
                        DeclKind::DeclareTransition {
                            from: name.clone(),
                            event: Some(event.name.clone()),
                            to: target.name.clone(),
                        },
                        edge.span,
                    ));
                }
                let via = HookTarget::Transition {
                    from: name.clone(),
                    via: event.name.clone(),
                };
                out.preconditions(&via, &edge.preconditions);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfsm_types::Span;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::default())
    }

    fn kinds(decls: Vec<Decl>) -> Vec<DeclKind> {
        decls.into_iter().map(|d| d.kind).collect()
    }

    #[test]
    fn option_keys_use_underscores() {
        let desc = Description {
            items: vec![Item::Option(OptionDecl {
                key: ident("state-enum"),
                value: "door_state".into(),
                span: Span::default(),
            })],
            span: Span::default(),
        };
        assert_eq!(
            kinds(lower(&desc)),
            vec![DeclKind::SetConfig {
                key: "state_enum".into(),
                value: "door_state".into()
            }]
        );
    }

    #[test]
    fn next_state_guards_apply_to_every_target() {
        let desc = Description {
            items: vec![Item::State(StateDecl {
                name: ident("A"),
                initial: false,
                body: vec![StateItem::NextState(Edges {
                    targets: vec![ident("B"), ident("C")],
                    preconditions: vec![ident("g")],
                    span: Span::default(),
                })],
                span: Span::default(),
            })],
            span: Span::default(),
        };
        let got = kinds(lower(&desc));
        assert_eq!(got[0], Decl::state("A").kind);
        assert_eq!(got[1], Decl::transition("A", None, "B").kind);
        assert_eq!(got[2], Decl::transition("A", None, "C").kind);
        assert_eq!(
            got[3],
            Decl::precondition(
                HookTarget::Transition {
                    from: "A".into(),
                    via: "B".into()
                },
                "g"
            )
            .kind
        );
        assert_eq!(got.len(), 5);
    }
}
