use crate::core::house_component::{ComponentType, HouseComponentInsulation};
use crate::core::material::{Insulation, MaterialUpdate};
use crate::errors::ConfigurationError;
use indexmap::IndexMap;
use smartstring::alias::String as ComponentId;
use std::sync::Arc;
use tracing::debug;

/// Persistent mapping of component id to component, with child → parent links.
///
/// Every operation that looks like a mutation returns a new tree; the receiver is
/// never modified. Component values are shared between trees derived from one another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentConfigurationTree {
    components: IndexMap<ComponentId, Arc<HouseComponentInsulation>>,
    parent_of: IndexMap<ComponentId, ComponentId>,
}

impl ComponentConfigurationTree {
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert or overwrite a component, optionally recording its parent.
    pub fn with_component(
        &self,
        parent_id: Option<&str>,
        component_id: &str,
        component: HouseComponentInsulation,
    ) -> Result<Self, ConfigurationError> {
        if component.building_materials.is_empty() {
            return Err(ConfigurationError::EmptyMaterialStack(
                component_id.to_string(),
            ));
        }

        let mut parent_of = self.parent_of.clone();
        if let Some(parent_id) = parent_id {
            if parent_id == component_id || self.is_ancestor_of(component_id, parent_id) {
                return Err(ConfigurationError::SelfParent {
                    component_id: component_id.to_string(),
                });
            }
            match self.parent_of.get(component_id) {
                Some(existing) if existing.as_str() != parent_id => {
                    return Err(ConfigurationError::ParentConflict {
                        component_id: component_id.to_string(),
                        existing: existing.to_string(),
                        requested: parent_id.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    parent_of.insert(component_id.into(), parent_id.into());
                }
            }
        }

        let mut components = self.components.clone();
        components.insert(component_id.into(), Arc::new(component));
        debug!(component_id, ?parent_id, "component registered");

        Ok(Self {
            components,
            parent_of,
        })
    }

    /// Remove a component. Its own parent link goes with it, and its children become roots.
    pub fn without_component(&self, component_id: &str) -> Result<Self, ConfigurationError> {
        if !self.components.contains_key(component_id) {
            return Err(ConfigurationError::ComponentNotFound(
                component_id.to_string(),
            ));
        }

        let mut components = self.components.clone();
        components.shift_remove(component_id);
        let parent_of = self
            .parent_of
            .iter()
            .filter(|(child, parent)| {
                child.as_str() != component_id && parent.as_str() != component_id
            })
            .map(|(child, parent)| (child.clone(), parent.clone()))
            .collect();
        debug!(component_id, "component unregistered");

        Ok(Self {
            components,
            parent_of,
        })
    }

    /// Return the component with its actual area resolved: raw area minus the actual
    /// areas of all of its children.
    pub fn get(&self, component_id: &str) -> Result<HouseComponentInsulation, ConfigurationError> {
        let component = self
            .components
            .get(component_id)
            .ok_or_else(|| ConfigurationError::ComponentNotFound(component_id.to_string()))?;

        let mut children_area = 0.;
        for child_id in self.children_of(component_id) {
            children_area += self.get(child_id)?.actual_area;
        }

        let actual_area = component.raw_area() - children_area;
        if actual_area <= 0. {
            return Err(ConfigurationError::InvalidArea {
                component_id: component_id.to_string(),
                area: actual_area,
            });
        }

        Ok(HouseComponentInsulation {
            actual_area,
            ..(**component).clone()
        })
    }

    /// All components in insertion order, each resolved through [`Self::get`].
    pub fn get_all(
        &self,
    ) -> Result<Vec<(ComponentId, HouseComponentInsulation)>, ConfigurationError> {
        self.components
            .keys()
            .map(|id| Ok((id.clone(), self.get(id)?)))
            .collect()
    }

    pub fn get_by_type(
        &self,
        component_type: ComponentType,
    ) -> Result<Vec<(ComponentId, HouseComponentInsulation)>, ConfigurationError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|(_, component)| component.component_type == component_type)
            .collect())
    }

    pub fn get_first_of_type(
        &self,
        component_type: ComponentType,
    ) -> Result<Option<(ComponentId, HouseComponentInsulation)>, ConfigurationError> {
        Ok(self.get_by_type(component_type)?.into_iter().next())
    }

    /// Swap the insulation of every component of the given type. Geometry and other
    /// component types are left untouched.
    pub fn with_new_insulation(
        &self,
        component_type: ComponentType,
        insulation: &Insulation,
    ) -> Result<Self, ConfigurationError> {
        if insulation.name.is_empty() {
            return Err(ConfigurationError::EmptyInsulationName);
        }
        if insulation.building_materials.is_empty() {
            return Err(ConfigurationError::EmptyMaterialStack(
                insulation.name.clone(),
            ));
        }

        let components = self
            .components
            .iter()
            .map(|(id, component)| {
                let component = if component.component_type == component_type {
                    Arc::new(component.with_insulation(insulation))
                } else {
                    component.clone()
                };
                (id.clone(), component)
            })
            .collect();
        debug!(%component_type, insulation = %insulation.name, "insulation changed");

        Ok(Self {
            components,
            parent_of: self.parent_of.clone(),
        })
    }

    /// Derive the named material layer with a new price and/or thickness on every
    /// component of the given type, keeping the insulation name.
    pub fn with_updated_material(
        &self,
        component_type: ComponentType,
        update: &MaterialUpdate,
    ) -> Result<Self, ConfigurationError> {
        let mut found = false;
        let components = self
            .components
            .iter()
            .map(|(id, component)| {
                if component.component_type != component_type
                    || !component
                        .building_materials
                        .iter()
                        .any(|material| material.name() == update.name)
                {
                    return (id.clone(), component.clone());
                }
                found = true;
                let building_materials = component
                    .building_materials
                    .iter()
                    .map(|material| {
                        if material.name() == update.name {
                            material.derive(update.price, update.thickness)
                        } else {
                            material.clone()
                        }
                    })
                    .collect();
                (
                    id.clone(),
                    Arc::new(HouseComponentInsulation {
                        building_materials,
                        ..(**component).clone()
                    }),
                )
            })
            .collect();

        if !found {
            return Err(ConfigurationError::UnknownMaterial {
                component_type,
                name: update.name.clone(),
            });
        }
        debug!(%component_type, material = %update.name, "material composition updated");

        Ok(Self {
            components,
            parent_of: self.parent_of.clone(),
        })
    }

    pub fn children_of<'a>(&'a self, component_id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.parent_of
            .iter()
            .filter(move |(_, parent)| parent.as_str() == component_id)
            .map(|(child, _)| child.as_str())
    }

    pub fn parent_of(&self, component_id: &str) -> Option<&str> {
        self.parent_of.get(component_id).map(ComponentId::as_str)
    }

    pub fn contains(&self, component_id: &str) -> bool {
        self.components.contains_key(component_id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn is_ancestor_of(&self, ancestor_id: &str, component_id: &str) -> bool {
        let mut current = self.parent_of(component_id);
        while let Some(parent) = current {
            if parent == ancestor_id {
                return true;
            }
            current = self.parent_of(parent);
        }
        false
    }
}
