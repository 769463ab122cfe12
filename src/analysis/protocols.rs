use crate::analysis::expr;
use crate::analysis::symbols::{Symbol, SymbolId, SymbolTable};
use crate::parse::Position;
use serde::Serialize;
use std::collections::BTreeSet;

/// A stub-only class treated as a structural interface.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProtocolDef {
    pub name: String,
    pub required_members: BTreeSet<String>,
    /// One of the bases is `Protocol` (any qualification or subscript).
    pub explicit: bool,
    #[serde(skip)]
    pub id: SymbolId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The class names the protocol in its base list.
    Nominal,
    /// The class declares every required member without naming the protocol.
    Structural,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Implementer {
    pub protocol: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub match_kind: MatchKind,
    pub position: Position,
}

/// Find protocol definitions and the same-file classes that implement them.
pub fn extract_protocols(
    symbols: &SymbolTable,
    require_protocol_base: bool,
) -> (Vec<ProtocolDef>, Vec<Implementer>) {
    let protocols: Vec<ProtocolDef> = symbols
        .classes()
        .filter(|class| class.is_stub)
        .filter_map(|class| {
            let explicit = class.bases.iter().any(|b| is_protocol_base(b));
            if require_protocol_base && !explicit {
                return None;
            }
            Some(ProtocolDef {
                name: class.qualified_name.clone(),
                required_members: symbols.methods_of(class.id).map(|m| m.name.clone()).collect(),
                explicit,
                id: class.id,
                position: class.position,
            })
        })
        .collect();

    let protocol_ids: BTreeSet<SymbolId> = protocols.iter().map(|p| p.id).collect();
    let mut implementers = Vec::new();
    for class in symbols.classes().filter(|c| !protocol_ids.contains(&c.id)) {
        let declared: BTreeSet<&str> = symbols.methods_of(class.id).map(|m| m.name.as_str()).collect();
        for protocol in &protocols {
            let match_kind = if names_base(class, symbols.get(protocol.id)) {
                MatchKind::Nominal
            } else if !protocol.required_members.is_empty()
                && protocol
                    .required_members
                    .iter()
                    .all(|member| declared.contains(member.as_str()))
            {
                MatchKind::Structural
            } else {
                continue;
            };
            implementers.push(Implementer {
                protocol: protocol.name.clone(),
                class_name: class.qualified_name.clone(),
                match_kind,
                position: class.position,
            });
        }
    }

    (protocols, implementers)
}

fn is_protocol_base(base: &str) -> bool {
    let name = expr::base_name(base);
    name.rsplit('.').next() == Some("Protocol")
}

/// `class C(P)`, `class C(mod.P)` or `class C(P[T])` name `P`.
fn names_base(class: &Symbol, protocol: &Symbol) -> bool {
    class.bases.iter().any(|base| {
        let name = expr::base_name(base);
        name == protocol.qualified_name || name.rsplit('.').next() == Some(protocol.name.as_str())
    })
}
