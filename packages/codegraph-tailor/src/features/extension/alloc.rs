//! Receiver objects → the calls that created them

use crate::config::ReflectionConfig;
use crate::errors::{Result, TailorError};
use crate::features::tagging::TagTable;
use crate::shared::models::{AllocSite, CallSite, ClassId, InvokeKind, MethodId, PointId, PointKind};
use crate::shared::ports::{PointsToProvider, ProgramGraph};

/// Local holding the receiver object of an instance call.
///
/// `Method.invoke` passes the receiver as its first argument; reflective
/// `newInstance` calls create it into the assigned local.
pub fn receiver_local<'s>(
    program: &dyn ProgramGraph,
    site: &'s CallSite,
    reflection: &ReflectionConfig,
) -> Option<&'s str> {
    let callee = program.method(site.target);
    let class = &program.class(callee.class).name;
    if reflection.method_invoke.matches(class, &callee.name) {
        site.args.first().map(String::as_str)
    } else if reflection.is_new_instance(class, &callee.name) {
        site.assigned.as_deref()
    } else {
        site.receiver.as_deref()
    }
}

pub struct AllocResolver<'r> {
    program: &'r dyn ProgramGraph,
    pts: &'r dyn PointsToProvider,
    tags: &'r TagTable,
    reflection: &'r ReflectionConfig,
}

impl<'r> AllocResolver<'r> {
    pub fn new(
        program: &'r dyn ProgramGraph,
        pts: &'r dyn PointsToProvider,
        tags: &'r TagTable,
        reflection: &'r ReflectionConfig,
    ) -> Self {
        Self {
            program,
            pts,
            tags,
            reflection,
        }
    }

    /// Calls creating the objects `local` may hold at `caller`, restricted to
    /// classes for which the call would actually dispatch to `target`.
    pub fn creation_calls(
        &self,
        caller: PointId,
        site: &CallSite,
        target: MethodId,
        local: &str,
    ) -> Result<Vec<PointId>> {
        let method = self.program.method_of(caller);
        let mut calls = Vec::new();
        for &id in self.pts.reaching_alloc_sites(method, local) {
            let alloc = self.pts.alloc_site(id);
            let Some((call, class)) = self.creation_call(alloc)? else {
                continue;
            };
            if self.is_possible_class(class, site, target) && !calls.contains(&call) {
                calls.push(call);
            }
        }
        Ok(calls)
    }

    /// `new` statements map to their constructor call, reflective
    /// allocations to the `newInstance` call itself.
    fn creation_call(&self, alloc: &AllocSite) -> Result<Option<(PointId, ClassId)>> {
        match &self.program.point(alloc.point).kind {
            PointKind::New { .. } => {
                let call = self
                    .tags
                    .constructor_call(alloc.point)
                    .flatten()
                    .ok_or_else(|| {
                        TailorError::extension(format!(
                            "allocation {} at {} has no constructor call",
                            alloc.id, alloc.point
                        ))
                    })?;
                let class = self
                    .program
                    .point(call)
                    .kind
                    .call_site()
                    .map(|s| self.program.method(s.target).class)
                    .unwrap_or(alloc.class);
                Ok(Some((call, class)))
            }
            PointKind::Call(site) => {
                let callee = self.program.method(site.target);
                let class = &self.program.class(callee.class).name;
                if self.reflection.is_new_instance(class, &callee.name) {
                    Ok(Some((alloc.point, alloc.class)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn is_possible_class(&self, class: ClassId, site: &CallSite, target: MethodId) -> bool {
        let target_method = self.program.method(target);
        if site.invoke == InvokeKind::Special || target_method.is_constructor() {
            return self.pts.is_subclass_including(class, target_method.class);
        }
        let declared = site.target;
        let declared_class = self.program.class_of_method(declared);
        let is_subtype = if declared_class.is_interface {
            self.pts.is_implementer(class, declared_class.id)
        } else {
            self.pts.is_subclass_including(class, declared_class.id)
        };
        is_subtype && self.pts.resolve_concrete_dispatch(class, declared) == Some(target)
    }
}
