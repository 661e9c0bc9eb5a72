use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

use crate::context::{Link, SimulationContext};
use crate::grouping::Group;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    NodeOnly,
    WithConnections,
}

impl SearchMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::NodeOnly => "Matches only",
            Self::WithConnections => "With connections",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Node(String),
    Group(String),
}

/// Which nodes are drawn and hit-testable. `None` means everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Visibility {
    nodes: Option<HashSet<usize>>,
}

impl Visibility {
    pub fn all() -> Self {
        Self { nodes: None }
    }

    pub fn only(nodes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            nodes: Some(nodes.into_iter().collect()),
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.nodes.is_some()
    }

    pub fn is_node_visible(&self, index: usize) -> bool {
        self.nodes.as_ref().is_none_or(|nodes| nodes.contains(&index))
    }

    /// Links are shown only when both endpoints are.
    pub fn is_link_visible(&self, link: &Link) -> bool {
        self.is_node_visible(link.source) && self.is_node_visible(link.target)
    }

    pub fn visible_nodes(&self, total: usize) -> Vec<usize> {
        (0..total).filter(|&index| self.is_node_visible(index)).collect()
    }

    fn intersect(self, other: Self) -> Self {
        match (self.nodes, other.nodes) {
            (None, nodes) | (nodes, None) => Self { nodes },
            (Some(left), Some(right)) => Self {
                nodes: Some(left.intersection(&right).copied().collect()),
            },
        }
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Nodes whose name fuzzily matches `term` or whose type label equals it, best match first.
pub fn search_matches(context: &SimulationContext, term: &str) -> Vec<usize> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = context
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            if node.kind.label().eq_ignore_ascii_case(term) {
                return Some((index, i64::MAX));
            }
            fuzzy_match_score(&matcher, &node.name, term).map(|score| (index, score))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(index, _)| index).collect()
}

pub fn expand_one_hop(
    context: &SimulationContext,
    seeds: impl IntoIterator<Item = usize>,
) -> HashSet<usize> {
    let mut expanded = HashSet::new();
    for seed in seeds {
        if seed >= context.len() {
            continue;
        }
        expanded.insert(seed);
        expanded.extend(context.neighbors(seed));
    }
    expanded
}

/// Search filter, then focus filter, intersected.
pub fn compute_visibility(
    context: &SimulationContext,
    groups: &[Group],
    search_term: &str,
    search_mode: SearchMode,
    focus: Option<&Focus>,
) -> Visibility {
    let searched = if search_term.trim().is_empty() {
        Visibility::all()
    } else {
        let matches = search_matches(context, search_term);
        match search_mode {
            SearchMode::NodeOnly => Visibility::only(matches),
            SearchMode::WithConnections => Visibility {
                nodes: Some(expand_one_hop(context, matches)),
            },
        }
    };

    let focused = match focus {
        None => Visibility::all(),
        Some(Focus::Node(id)) => Visibility {
            nodes: Some(expand_one_hop(context, context.index_of(id))),
        },
        Some(Focus::Group(key)) => {
            let members = groups
                .iter()
                .find(|group| &group.key == key)
                .map(|group| group.members.clone())
                .unwrap_or_default();
            Visibility {
                nodes: Some(expand_one_hop(context, members)),
            }
        }
    };

    searched.intersect(focused)
}
