use std::ops::{Deref, DerefMut};

use crate::errors::ResolutionError;

/// Types currently being built within one resolution call tree
///
/// The stack is passed down explicitly through every nested resolution, it is never
/// stored on a container. Entries are added through guards which remove them again
/// when dropped, so every exit path - success, error or early return - unwinds the stack.
#[derive(Debug, Clone, Default)]
pub struct BuildStack {
    building: Vec<String>,
    depth: usize,
}

impl BuildStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Types under construction, outermost first
    pub fn building(&self) -> &[String] {
        &self.building
    }

    /// Number of nested resolutions currently in progress
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.building.iter().any(|entry| entry == type_id)
    }

    /// Enters one nested resolution of `id`
    pub fn descend(&mut self, id: &str, max_depth: usize) -> Result<BuildGuard<'_>, ResolutionError> {
        if self.depth >= max_depth {
            return Err(ResolutionError::DepthExceeded {
                id: id.to_string(),
                max_depth,
            });
        }

        self.depth += 1;
        Ok(BuildGuard {
            stack: self,
            frame: Frame::Depth,
        })
    }

    /// Marks `type_id` as being built
    ///
    /// Fails if the type is already being built further up - it would depend on itself.
    pub fn push(&mut self, type_id: &str) -> Result<BuildGuard<'_>, ResolutionError> {
        if self.contains(type_id) {
            let mut chain = self.building.clone();
            chain.push(type_id.to_string());

            return Err(ResolutionError::CircularDependency {
                type_id: type_id.to_string(),
                chain,
            });
        }

        self.building.push(type_id.to_string());
        Ok(BuildGuard {
            stack: self,
            frame: Frame::Building,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Depth,
    Building,
}

/// Scoped entry on a [BuildStack] - derefs to the stack so nested resolutions can keep using it
#[derive(Debug)]
pub struct BuildGuard<'a> {
    stack: &'a mut BuildStack,
    frame: Frame,
}
impl Deref for BuildGuard<'_> {
    type Target = BuildStack;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}
impl DerefMut for BuildGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}
impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        match self.frame {
            Frame::Depth => self.stack.depth -= 1,
            Frame::Building => {
                self.stack.building.pop();
            }
        }
    }
}
