//! Identifying still lifes, oscillators and spaceships.

use crate::{
    cells::Coord,
    grid::Grid,
    rules::{Rule, Transition},
    simulator::{active_cells, neighbour_states, Simulator},
    topology::Topology,
};
use educe::Educe;
use log::debug;
use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display, Formatter},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options for pattern identification.
#[derive(Clone, Copy, Debug, Educe, PartialEq, Eq)]
#[educe(Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdentifyOptions {
    /// The maximal number of generations to run.
    ///
    /// Patterns with a larger period are reported as
    /// [`Unidentified`](PatternKind::Unidentified).
    #[educe(Default = 1000)]
    pub max_period: u64,

    /// Whether rotated and reflected phases hash to the same value.
    ///
    /// Repeats are always verified exactly, so this only changes
    /// the canonical form of the result.
    pub orientation_invariant: bool,

    /// Whether to infer the minimum and maximum rules,
    /// when the rule supports them.
    pub min_max_rule: bool,
}

impl IdentifyOptions {
    /// Options with the given maximal period.
    pub fn new(max_period: u64) -> Self {
        IdentifyOptions {
            max_period,
            ..IdentifyOptions::default()
        }
    }

    /// Sets whether hashing ignores orientation.
    pub fn set_orientation_invariant(mut self, orientation_invariant: bool) -> Self {
        self.orientation_invariant = orientation_invariant;
        self
    }

    /// Sets whether to infer the minimum and maximum rules.
    pub fn set_min_max_rule(mut self, min_max_rule: bool) -> Self {
        self.min_max_rule = min_max_rule;
        self
    }
}

/// What kind of object a pattern turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PatternKind {
    /// Period 1, no displacement.
    StillLife,
    /// Period larger than 1, no displacement.
    Oscillator,
    /// Non-zero displacement.
    Spaceship,
    /// No repeat found within the allowed number of generations,
    /// or stopped early by the caller.
    Unidentified,
}

/// The result of identifying a pattern.
#[derive(Educe)]
#[educe(Clone, Debug)]
pub struct PatternResult<R: Rule> {
    /// What kind of object it is.
    pub kind: PatternKind,

    /// The period. `0` if unidentified.
    pub period: u64,

    /// How far the bounding box moves in one period.
    ///
    /// With the y axis pointing downwards, a glider moving towards the
    /// bottom right has displacement `(1, 1)`.
    pub displacement: Coord,

    /// The pattern at the generation where identification ended.
    pub phase: Grid,

    /// The smallest canonical form among all phases of the cycle.
    ///
    /// For unidentified patterns, the canonical form of
    /// [`phase`](#structfield.phase).
    pub canonical: Grid,

    /// Hash of [`canonical`](#structfield.canonical).
    pub hash: u64,

    /// The rule it was run under.
    pub rule: R,

    /// The minimal rule in which the pattern evolves the same way.
    pub min_rule: Option<R>,

    /// The maximal rule in which the pattern evolves the same way.
    pub max_rule: Option<R>,
}

impl<R: Rule> PatternResult<R> {
    /// Whether a repeat was found.
    pub fn is_identified(&self) -> bool {
        self.kind != PatternKind::Unidentified
    }

    /// The population of [`phase`](#structfield.phase).
    pub fn population(&self) -> usize {
        self.phase.population()
    }

    /// Whether the pattern moves along neither an axis nor a diagonal.
    pub fn is_oblique(&self) -> bool {
        let Coord { x, y } = self.displacement;
        x != 0 && y != 0 && x.abs() != y.abs()
    }

    fn unidentified(rule: &R, phase: Grid, orientation_invariant: bool) -> Self {
        let canonical = phase.canonical(orientation_invariant);
        let hash = hash_of(&canonical);
        PatternResult {
            kind: PatternKind::Unidentified,
            period: 0,
            displacement: Coord::ORIGIN,
            phase,
            canonical,
            hash,
            rule: rule.clone(),
            min_rule: None,
            max_rule: None,
        }
    }
}

impl<R: Rule> Display for PatternResult<R> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.kind {
            PatternKind::StillLife => write!(f, "Still Life"),
            PatternKind::Oscillator => write!(f, "P{} Oscillator", self.period),
            PatternKind::Spaceship => write!(
                f,
                "({}, {})c/{} Spaceship",
                self.displacement.x, self.displacement.y, self.period
            ),
            PatternKind::Unidentified => write!(f, "Unidentified"),
        }
    }
}

fn hash_of(grid: &Grid) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    grid.hash(&mut hasher);
    hasher.finish()
}

/// Runs the simulator until the pattern repeats.
///
/// Every generation is hashed together with its position in the
/// alternating background period. A hash match is only accepted after
/// checking the population, the shape of the bounding box and every cell.
pub(crate) fn identify<R, F>(
    sim: &mut Simulator<R>,
    options: &IdentifyOptions,
    mut keep_going: F,
) -> PatternResult<R>
where
    R: Rule,
    F: FnMut(&Grid) -> bool,
{
    let rule = sim.rule();
    let orientation_invariant = options.orientation_invariant;
    let alternating_period = rule.alternating_period() as u64;
    let start = sim.generation();

    let mut history: Vec<Grid> = Vec::new();
    let mut seen: HashMap<(u64, u64), Vec<usize>> = HashMap::new();

    loop {
        let grid = sim.grid();
        let key = (
            grid.canonical_hash(orientation_invariant),
            sim.generation() % alternating_period,
        );

        if let Some(earlier) = seen.get(&key) {
            for &i in earlier {
                if let Some(displacement) = repeat_offset(&history[i], grid) {
                    let period = (history.len() - i) as u64;
                    debug!("repeat after {} generations, period {}", history.len(), period);
                    return classify(sim, options, &history, i, period, displacement);
                }
            }
        }

        if history.len() as u64 >= options.max_period {
            break;
        }

        seen.entry(key).or_default().push(history.len());
        history.push(grid.clone());
        sim.step();
        if !keep_going(sim.grid()) {
            debug!("stopped at generation {}", sim.generation() - start);
            break;
        }
    }

    PatternResult::unidentified(rule, sim.grid().clone(), orientation_invariant)
}

/// The offset from `earlier` to `current` if one is a translate of the other.
fn repeat_offset(earlier: &Grid, current: &Grid) -> Option<Coord> {
    if earlier.population() != current.population() {
        return None;
    }
    let offset = match (earlier.bounds(), current.bounds()) {
        (Some((min0, max0)), Some((min1, max1))) => {
            if max1 - min1 != max0 - min0 {
                return None;
            }
            min1 - min0
        }
        (None, None) => Coord::ORIGIN,
        _ => return None,
    };
    if earlier.equals_shifted(current, offset) {
        Some(offset)
    } else {
        None
    }
}

fn classify<R: Rule>(
    sim: &Simulator<R>,
    options: &IdentifyOptions,
    history: &[Grid],
    first: usize,
    period: u64,
    displacement: Coord,
) -> PatternResult<R> {
    let rule = sim.rule();
    let kind = if displacement != Coord::ORIGIN {
        PatternKind::Spaceship
    } else if period == 1 {
        PatternKind::StillLife
    } else {
        PatternKind::Oscillator
    };

    let canonical = history[first..]
        .iter()
        .map(|grid| grid.canonical(options.orientation_invariant))
        .min_by_key(Grid::sorted_cells)
        .unwrap_or_default();
    let hash = hash_of(&canonical);

    let (min_rule, max_rule) = if options.min_max_rule && rule.supports_range() {
        let start = sim.generation() - history.len() as u64;
        let mut trajectory: Vec<&Grid> = history.iter().collect();
        trajectory.push(sim.grid());
        let transitions = observed_transitions(rule, sim.topology(), &trajectory, start);
        match rule.min_max_rule(&transitions) {
            Ok((min, max)) => (Some(min), Some(max)),
            Err(_) => (None, None),
        }
    } else {
        (None, None)
    };

    PatternResult {
        kind,
        period,
        displacement,
        phase: sim.grid().clone(),
        canonical,
        hash,
        rule: rule.clone(),
        min_rule,
        max_rule,
    }
}

/// Every distinct transition along a trajectory, in absolute states.
///
/// `trajectory[0]` is at generation `start`. The background itself is
/// included as one transition per generation.
pub(crate) fn observed_transitions<R: Rule>(
    rule: &R,
    topology: &Topology,
    trajectory: &[&Grid],
    start: u64,
) -> Vec<Transition> {
    let mut transitions = HashSet::new();
    let mut neighbours = Vec::new();
    for (i, pair) in trajectory.windows(2).enumerate() {
        let (grid, next) = (pair[0], pair[1]);
        let generation = start + i as u64;
        let neighbourhood = rule.neighbourhood(generation);

        let background = rule.background(generation);
        transitions.insert(Transition {
            neighbours: vec![background; neighbourhood.len()],
            state: background,
            next: rule.background(generation + 1),
        });

        for coord in active_cells(grid, neighbourhood, topology) {
            neighbour_states(
                rule,
                grid,
                topology,
                neighbourhood,
                coord,
                generation,
                &mut neighbours,
            );
            transitions.insert(Transition {
                neighbours: neighbours.clone(),
                state: rule.convert_state(grid.get(coord), generation),
                next: rule.convert_state(next.get(coord), generation + 1),
            });
        }
    }
    transitions.into_iter().collect()
}
