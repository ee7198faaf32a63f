// crates/engine_render/src/frame.rs

use std::collections::HashMap;

use crate::error::RenderError;

/// Logical resource identifier for this frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResourceId(pub u32);

/// Simple resource kind classification (can be extended later).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResourceKind {
    Color,
    Depth,
}

/// Per-frame logical resource description.
#[derive(Copy, Clone, Debug)]
pub struct ResourceDesc {
    pub id: ResourceId,
    pub name: &'static str,
    pub kind: ResourceKind,

    /// Optional alias group. Resources that share the same non-None group
    /// are *allowed* to alias, but only if their lifetimes do not overlap.
    pub alias_group: Option<u32>,
}

/// Description of a single render pass in the DAG.
#[derive(Clone, Debug)]
pub struct PassDesc {
    pub name: &'static str,
    /// Resources read by this pass.
    pub reads: &'static [ResourceId],
    /// Resources written by this pass.
    pub writes: &'static [ResourceId],
}

/// Static description of the frame's pass topology.
#[derive(Clone, Debug)]
pub struct FrameGraphDesc {
    pub resources: &'static [ResourceDesc],
    pub passes: &'static [PassDesc],
}

/// Logical resource IDs used by the water frame.
pub mod ids {
    use super::ResourceId;

    /// Water displacement target (height pass output).
    pub const WATER_HEIGHT: ResourceId = ResourceId(0);
    /// Mirrored-camera scene render target.
    pub const REFLECTION: ResourceId = ResourceId(1);
    /// Clip-plane scene render target.
    pub const REFRACTION: ResourceId = ResourceId(2);
    /// Final backbuffer (surface texture).
    pub const BACKBUFFER: ResourceId = ResourceId(3);
}

/// The mandatory water pass ordering: the three offscreen passes write their
/// targets before the surface pass samples all of them into the backbuffer.
///
/// The topology is static per frame; this is the declared contract the
/// runtime pass log in `water.rs` enforces call-by-call.
pub fn water_frame_graph() -> FrameGraphDesc {
    use ids::*;

    const RESOURCES: &[ResourceDesc] = &[
        ResourceDesc {
            id: WATER_HEIGHT,
            name: "WaterHeight",
            kind: ResourceKind::Color,
            alias_group: None,
        },
        ResourceDesc {
            id: REFLECTION,
            name: "Reflection",
            kind: ResourceKind::Color,
            alias_group: None,
        },
        ResourceDesc {
            id: REFRACTION,
            name: "Refraction",
            kind: ResourceKind::Color,
            alias_group: None,
        },
        ResourceDesc {
            id: BACKBUFFER,
            name: "Backbuffer",
            kind: ResourceKind::Color,
            alias_group: None, // surface is not aliasable in this design
        },
    ];

    const PASSES: &[PassDesc] = &[
        PassDesc {
            name: "WaterHeightPass",
            reads: &[],
            writes: &[WATER_HEIGHT],
        },
        PassDesc {
            name: "ReflectionPass",
            reads: &[],
            writes: &[REFLECTION],
        },
        PassDesc {
            name: "RefractionPass",
            reads: &[],
            writes: &[REFRACTION],
        },
        PassDesc {
            name: "WaterSurfacePass",
            reads: &[WATER_HEIGHT, REFLECTION, REFRACTION],
            writes: &[BACKBUFFER],
        },
    ];

    FrameGraphDesc {
        resources: RESOURCES,
        passes: PASSES,
    }
}

/// Validates a logical pass DAG before it touches the GPU:
///
/// - every resource referenced by a pass must exist;
/// - a resource that is written and read must not be read before its first
///   write in the declared pass order;
/// - resources sharing an alias group must not have overlapping lifetimes.
pub fn validate(desc: &FrameGraphDesc) -> Result<(), RenderError> {
    // Map ResourceId -> index in desc.resources
    let mut resource_index: HashMap<ResourceId, usize> = HashMap::new();
    for (idx, r) in desc.resources.iter().enumerate() {
        if resource_index.insert(r.id, idx).is_some() {
            return Err(RenderError::FrameGraph(format!(
                "duplicate ResourceId({:?}) for '{}'",
                r.id, r.name
            )));
        }
    }

    // Track lifetimes: for each resource, first and last pass index.
    #[derive(Clone, Copy)]
    struct Lifetime {
        first: usize,
        last: usize,
    }

    let mut lifetimes: HashMap<ResourceId, Lifetime> = HashMap::new();
    let mut first_read: HashMap<ResourceId, usize> = HashMap::new();
    let mut first_write: HashMap<ResourceId, usize> = HashMap::new();

    // Helper to update lifetime for any access (read or write).
    fn bump(
        lifetimes: &mut HashMap<ResourceId, Lifetime>,
        rid: ResourceId,
        pass_idx: usize,
    ) {
        lifetimes
            .entry(rid)
            .and_modify(|lt| {
                lt.first = lt.first.min(pass_idx);
                lt.last = lt.last.max(pass_idx);
            })
            .or_insert(Lifetime {
                first: pass_idx,
                last: pass_idx,
            });
    }

    for (pass_idx, pass) in desc.passes.iter().enumerate() {
        for &rid in pass.reads {
            if !resource_index.contains_key(&rid) {
                return Err(RenderError::FrameGraph(format!(
                    "pass '{}' reads unknown resource {:?}",
                    pass.name, rid
                )));
            }
            bump(&mut lifetimes, rid, pass_idx);
            first_read.entry(rid).or_insert(pass_idx);
        }

        for &rid in pass.writes {
            if !resource_index.contains_key(&rid) {
                return Err(RenderError::FrameGraph(format!(
                    "pass '{}' writes unknown resource {:?}",
                    pass.name, rid
                )));
            }
            bump(&mut lifetimes, rid, pass_idx);
            first_write.entry(rid).or_insert(pass_idx);
        }
    }

    // A resource written and read in this graph must not be read before its
    // first write according to the declared pass order.
    for (&rid, &write_idx) in &first_write {
        if let Some(&read_idx) = first_read.get(&rid) {
            if read_idx < write_idx {
                let r = &desc.resources[resource_index[&rid]];
                return Err(RenderError::FrameGraph(format!(
                    "resource '{}' is first read in pass index {} but first written at pass index {}; \
                     reorder so writes happen before reads",
                    r.name, read_idx, write_idx
                )));
            }
        }
    }

    // Alias-group check: members of the same group must not have overlapping
    // lifetimes.
    let mut group_members: HashMap<u32, Vec<(Lifetime, &'static str)>> = HashMap::new();
    for r in desc.resources {
        if let (Some(group), Some(lt)) = (r.alias_group, lifetimes.get(&r.id)) {
            group_members.entry(group).or_default().push((*lt, r.name));
        }
    }

    for (group, members) in group_members {
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (lt_a, name_a) = members[i];
                let (lt_b, name_b) = members[j];
                let overlaps = lt_a.first <= lt_b.last && lt_b.first <= lt_a.last;
                if overlaps {
                    return Err(RenderError::FrameGraph(format!(
                        "alias group {group}: '{name_a}' and '{name_b}' have overlapping lifetimes \
                         ({}..={} vs {}..={})",
                        lt_a.first, lt_a.last, lt_b.first, lt_b.last
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_graph_is_valid() {
        validate(&water_frame_graph()).unwrap();
    }

    #[test]
    fn read_before_write_is_rejected() {
        use super::ids::*;

        const RESOURCES: &[ResourceDesc] = &[
            ResourceDesc {
                id: REFLECTION,
                name: "Reflection",
                kind: ResourceKind::Color,
                alias_group: None,
            },
            ResourceDesc {
                id: BACKBUFFER,
                name: "Backbuffer",
                kind: ResourceKind::Color,
                alias_group: None,
            },
        ];

        // Surface pass declared before the pass producing its input.
        const PASSES: &[PassDesc] = &[
            PassDesc {
                name: "WaterSurfacePass",
                reads: &[REFLECTION],
                writes: &[BACKBUFFER],
            },
            PassDesc {
                name: "ReflectionPass",
                reads: &[],
                writes: &[REFLECTION],
            },
        ];

        let desc = FrameGraphDesc {
            resources: RESOURCES,
            passes: PASSES,
        };
        assert!(matches!(validate(&desc), Err(RenderError::FrameGraph(_))));
    }

    #[test]
    fn unknown_resource_is_rejected() {
        const RESOURCES: &[ResourceDesc] = &[];
        const PASSES: &[PassDesc] = &[PassDesc {
            name: "Orphan",
            reads: &[ResourceId(9)],
            writes: &[],
        }];
        let desc = FrameGraphDesc {
            resources: RESOURCES,
            passes: PASSES,
        };
        assert!(validate(&desc).is_err());
    }

    #[test]
    fn overlapping_alias_lifetimes_are_rejected() {
        const A: ResourceId = ResourceId(0);
        const B: ResourceId = ResourceId(1);
        const RESOURCES: &[ResourceDesc] = &[
            ResourceDesc {
                id: A,
                name: "A",
                kind: ResourceKind::Color,
                alias_group: Some(0),
            },
            ResourceDesc {
                id: B,
                name: "B",
                kind: ResourceKind::Color,
                alias_group: Some(0),
            },
        ];
        const PASSES: &[PassDesc] = &[PassDesc {
            name: "Both",
            reads: &[],
            writes: &[A, B],
        }];
        let desc = FrameGraphDesc {
            resources: RESOURCES,
            passes: PASSES,
        };
        assert!(validate(&desc).is_err());
    }
}
