/// Material: concrete resources bound to the slots of a shader.
///
/// One descriptor set is allocated per slot. Setters are typed: the slot
/// must exist and have the setter's type, otherwise the call fails without
/// touching the material. A successful set writes the descriptors
/// immediately. `*WithInfo` slots get a small uniform buffer at binding 1
/// holding `vec4(width, height, 1/width, 1/height)` of the bound view.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use rustc_hash::FxHashMap;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{
    CommandBuffer, DescriptorResource, DescriptorType, DescriptorWrite, ImageLayout,
};
use crate::resource::{Buffer, DescriptorSet, Image, ImageSampler};
use crate::shader::{Shader, ShaderSlotType, SlotDescriptor};
use crate::{engine_bail, engine_bail_invalid, engine_err_invalid};

/// Content of the info buffer of `*WithInfo` slots
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ImageInfo {
    pub size: Vec4,
}

/// A sampled image binding
#[derive(Clone)]
pub struct TextureBinding {
    pub image: Arc<Image>,
    pub view: String,
    pub sampler: Arc<ImageSampler>,
}

/// A storage or input attachment image binding
#[derive(Clone)]
pub struct ImageBinding {
    pub image: Arc<Image>,
    pub view: String,
}

/// Resource bound to one slot
#[derive(Clone)]
pub enum SlotResource {
    UniformBuffer(Arc<Buffer>),
    StorageBuffer(Arc<Buffer>),
    UniformTexelBuffer(Arc<Buffer>),
    StorageTexelBuffer(Arc<Buffer>),
    Texture2D(TextureBinding),
    Texture2DWithInfo(TextureBinding),
    StorageTexture2D(ImageBinding),
    StorageTexture2DWithInfo(ImageBinding),
    TextureCube(TextureBinding),
    InputAttachment(ImageBinding),
}

impl SlotResource {
    pub fn slot_type(&self) -> ShaderSlotType {
        match self {
            SlotResource::UniformBuffer(_) => ShaderSlotType::UniformBuffer,
            SlotResource::StorageBuffer(_) => ShaderSlotType::StorageBuffer,
            SlotResource::UniformTexelBuffer(_) => ShaderSlotType::UniformTexelBuffer,
            SlotResource::StorageTexelBuffer(_) => ShaderSlotType::StorageTexelBuffer,
            SlotResource::Texture2D(_) => ShaderSlotType::Texture2D,
            SlotResource::Texture2DWithInfo(_) => ShaderSlotType::Texture2DWithInfo,
            SlotResource::StorageTexture2D(_) => ShaderSlotType::StorageTexture2D,
            SlotResource::StorageTexture2DWithInfo(_) => ShaderSlotType::StorageTexture2DWithInfo,
            SlotResource::TextureCube(_) => ShaderSlotType::TextureCube,
            SlotResource::InputAttachment(_) => ShaderSlotType::InputAttachment,
        }
    }
}

struct MaterialSlot {
    descriptor: SlotDescriptor,
    descriptor_set: DescriptorSet,
    info_buffer: Option<Buffer>,
    resource: Option<SlotResource>,
}

pub struct Material {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    slots: FxHashMap<String, MaterialSlot>,
    /// Slot names ordered by set index
    bind_order: Vec<String>,
}

impl Material {
    /// Allocate one descriptor set per shader slot
    pub fn new(ctx: &Arc<GraphicsContext>, shader: &Arc<Shader>) -> Result<Self> {
        let mut slots = FxHashMap::default();

        for descriptor in shader.slots() {
            let layout = match shader.descriptor_set_layout(descriptor.set) {
                Some(layout) => layout,
                None => engine_bail!("x2::Material",
                    "Shader '{}' has no layout for set {}", shader.name(), descriptor.set),
            };
            let descriptor_set = DescriptorSet::allocate(ctx, layout)?;
            let info_buffer = if descriptor.slot_type.has_info() {
                Some(Buffer::uniform::<ImageInfo>(ctx)?)
            } else {
                None
            };

            slots.insert(descriptor.name.clone(), MaterialSlot {
                descriptor: descriptor.clone(),
                descriptor_set,
                info_buffer,
                resource: None,
            });
        }

        let mut bind_order: Vec<String> = slots.keys().cloned().collect();
        bind_order.sort_by_key(|name| slots[name].descriptor.set);

        Ok(Self {
            ctx: ctx.clone(),
            shader: shader.clone(),
            slots,
            bind_order,
        })
    }

    pub fn shader(&self) -> &Arc<Shader> {
        &self.shader
    }

    /// Whether every slot has a resource
    pub fn is_complete(&self) -> bool {
        self.slots.values().all(|slot| slot.resource.is_some())
    }

    // ===== SETTERS =====

    pub fn set_uniform_buffer(&mut self, name: &str, buffer: Arc<Buffer>) -> Result<()> {
        self.set(name, SlotResource::UniformBuffer(buffer))
    }

    pub fn set_storage_buffer(&mut self, name: &str, buffer: Arc<Buffer>) -> Result<()> {
        self.set(name, SlotResource::StorageBuffer(buffer))
    }

    pub fn set_uniform_texel_buffer(&mut self, name: &str, buffer: Arc<Buffer>) -> Result<()> {
        self.set(name, SlotResource::UniformTexelBuffer(buffer))
    }

    pub fn set_storage_texel_buffer(&mut self, name: &str, buffer: Arc<Buffer>) -> Result<()> {
        self.set(name, SlotResource::StorageTexelBuffer(buffer))
    }

    pub fn set_texture2d(&mut self, name: &str, image: Arc<Image>, view: &str, sampler: Arc<ImageSampler>) -> Result<()> {
        self.set(name, SlotResource::Texture2D(TextureBinding { image, view: view.to_string(), sampler }))
    }

    pub fn set_texture2d_with_info(&mut self, name: &str, image: Arc<Image>, view: &str, sampler: Arc<ImageSampler>) -> Result<()> {
        self.set(name, SlotResource::Texture2DWithInfo(TextureBinding { image, view: view.to_string(), sampler }))
    }

    pub fn set_storage_texture2d(&mut self, name: &str, image: Arc<Image>, view: &str) -> Result<()> {
        self.set(name, SlotResource::StorageTexture2D(ImageBinding { image, view: view.to_string() }))
    }

    pub fn set_storage_texture2d_with_info(&mut self, name: &str, image: Arc<Image>, view: &str) -> Result<()> {
        self.set(name, SlotResource::StorageTexture2DWithInfo(ImageBinding { image, view: view.to_string() }))
    }

    pub fn set_texture_cube(&mut self, name: &str, image: Arc<Image>, view: &str, sampler: Arc<ImageSampler>) -> Result<()> {
        self.set(name, SlotResource::TextureCube(TextureBinding { image, view: view.to_string(), sampler }))
    }

    pub fn set_input_attachment(&mut self, name: &str, image: Arc<Image>, view: &str) -> Result<()> {
        self.set(name, SlotResource::InputAttachment(ImageBinding { image, view: view.to_string() }))
    }

    /// Bind `resource` to slot `name` and write its descriptors
    ///
    /// # Errors
    ///
    /// Returns an error (leaving the slot untouched) if the slot does not
    /// exist, has another type, the resource is unusable (missing view or
    /// texel view) or the descriptor write fails.
    pub fn set(&mut self, name: &str, resource: SlotResource) -> Result<()> {
        let slot = self.typed_slot(name, resource.slot_type())?;

        let mut writes = Vec::with_capacity(2);
        match &resource {
            SlotResource::UniformBuffer(buffer) | SlotResource::StorageBuffer(buffer) => {
                writes.push(DescriptorWrite {
                    binding: 0,
                    descriptor_type: slot.descriptor.descriptor_types[0],
                    resource: DescriptorResource::Buffer {
                        buffer: buffer.gpu_buffer(),
                        offset: 0,
                        range: buffer.size(),
                    },
                });
            }
            SlotResource::UniformTexelBuffer(buffer) | SlotResource::StorageTexelBuffer(buffer) => {
                let view = match buffer.view() {
                    Some(view) => view,
                    None => engine_bail_invalid!("x2::Material",
                        "Slot '{}' needs a buffer with a texel view", name),
                };
                writes.push(DescriptorWrite {
                    binding: 0,
                    descriptor_type: slot.descriptor.descriptor_types[0],
                    resource: DescriptorResource::TexelBuffer(view),
                });
            }
            SlotResource::Texture2D(texture)
            | SlotResource::Texture2DWithInfo(texture)
            | SlotResource::TextureCube(texture) => {
                writes.push(DescriptorWrite {
                    binding: 0,
                    descriptor_type: DescriptorType::CombinedImageSampler,
                    resource: DescriptorResource::CombinedImageSampler {
                        view: texture.image.view(&texture.view)?.gpu_view(),
                        sampler: texture.sampler.gpu_sampler(),
                        layout: ImageLayout::ShaderReadOnlyOptimal,
                    },
                });
            }
            SlotResource::StorageTexture2D(image) | SlotResource::StorageTexture2DWithInfo(image) => {
                writes.push(DescriptorWrite {
                    binding: 0,
                    descriptor_type: DescriptorType::StorageImage,
                    resource: DescriptorResource::StorageImage {
                        view: image.image.view(&image.view)?.gpu_view(),
                    },
                });
            }
            SlotResource::InputAttachment(image) => {
                writes.push(DescriptorWrite {
                    binding: 0,
                    descriptor_type: DescriptorType::InputAttachment,
                    resource: DescriptorResource::InputAttachment {
                        view: image.image.view(&image.view)?.gpu_view(),
                    },
                });
            }
        }

        let info = match &resource {
            SlotResource::Texture2DWithInfo(texture) => Some((&texture.image, &texture.view)),
            SlotResource::StorageTexture2DWithInfo(image) => Some((&image.image, &image.view)),
            _ => None,
        };
        let mut info_update = None;
        if let (Some((image, view)), Some(info_buffer)) = (info, &slot.info_buffer) {
            let mip = image.view(view)?.desc().base_mip_level;
            let extent = image.mip_extent(mip);
            let (width, height) = (extent.width as f32, extent.height as f32);
            info_update = Some((info_buffer, ImageInfo {
                size: Vec4::new(width, height, 1.0 / width, 1.0 / height),
            }));
            writes.push(DescriptorWrite {
                binding: 1,
                descriptor_type: DescriptorType::UniformBuffer,
                resource: DescriptorResource::Buffer {
                    buffer: info_buffer.gpu_buffer(),
                    offset: 0,
                    range: info_buffer.size(),
                },
            });
        }

        slot.descriptor_set.write(&self.ctx, &writes)?;
        // Info content follows the descriptor, never ahead of it
        if let Some((info_buffer, info)) = info_update {
            info_buffer.write_value(&info)?;
        }

        if let Some(slot) = self.slots.get_mut(name) {
            slot.resource = Some(resource);
        }
        Ok(())
    }

    // ===== GETTERS =====

    pub fn get_uniform_buffer(&self, name: &str) -> Result<Option<&Arc<Buffer>>> {
        Ok(match self.get(name, ShaderSlotType::UniformBuffer)? {
            Some(SlotResource::UniformBuffer(buffer)) => Some(buffer),
            _ => None,
        })
    }

    pub fn get_storage_buffer(&self, name: &str) -> Result<Option<&Arc<Buffer>>> {
        Ok(match self.get(name, ShaderSlotType::StorageBuffer)? {
            Some(SlotResource::StorageBuffer(buffer)) => Some(buffer),
            _ => None,
        })
    }

    pub fn get_uniform_texel_buffer(&self, name: &str) -> Result<Option<&Arc<Buffer>>> {
        Ok(match self.get(name, ShaderSlotType::UniformTexelBuffer)? {
            Some(SlotResource::UniformTexelBuffer(buffer)) => Some(buffer),
            _ => None,
        })
    }

    pub fn get_storage_texel_buffer(&self, name: &str) -> Result<Option<&Arc<Buffer>>> {
        Ok(match self.get(name, ShaderSlotType::StorageTexelBuffer)? {
            Some(SlotResource::StorageTexelBuffer(buffer)) => Some(buffer),
            _ => None,
        })
    }

    pub fn get_texture2d(&self, name: &str) -> Result<Option<&TextureBinding>> {
        Ok(match self.get(name, ShaderSlotType::Texture2D)? {
            Some(SlotResource::Texture2D(texture)) => Some(texture),
            _ => None,
        })
    }

    pub fn get_texture2d_with_info(&self, name: &str) -> Result<Option<&TextureBinding>> {
        Ok(match self.get(name, ShaderSlotType::Texture2DWithInfo)? {
            Some(SlotResource::Texture2DWithInfo(texture)) => Some(texture),
            _ => None,
        })
    }

    pub fn get_storage_texture2d(&self, name: &str) -> Result<Option<&ImageBinding>> {
        Ok(match self.get(name, ShaderSlotType::StorageTexture2D)? {
            Some(SlotResource::StorageTexture2D(image)) => Some(image),
            _ => None,
        })
    }

    pub fn get_storage_texture2d_with_info(&self, name: &str) -> Result<Option<&ImageBinding>> {
        Ok(match self.get(name, ShaderSlotType::StorageTexture2DWithInfo)? {
            Some(SlotResource::StorageTexture2DWithInfo(image)) => Some(image),
            _ => None,
        })
    }

    pub fn get_texture_cube(&self, name: &str) -> Result<Option<&TextureBinding>> {
        Ok(match self.get(name, ShaderSlotType::TextureCube)? {
            Some(SlotResource::TextureCube(texture)) => Some(texture),
            _ => None,
        })
    }

    pub fn get_input_attachment(&self, name: &str) -> Result<Option<&ImageBinding>> {
        Ok(match self.get(name, ShaderSlotType::InputAttachment)? {
            Some(SlotResource::InputAttachment(image)) => Some(image),
            _ => None,
        })
    }

    /// Resource bound to `name`, checked against `expected`
    pub fn get(&self, name: &str, expected: ShaderSlotType) -> Result<Option<&SlotResource>> {
        Ok(self.typed_slot(name, expected)?.resource.as_ref())
    }

    /// Info buffer of a `*WithInfo` slot
    pub fn info_buffer(&self, name: &str) -> Option<&Buffer> {
        self.slots.get(name).and_then(|slot| slot.info_buffer.as_ref())
    }

    // ===== BINDING =====

    /// Bind every slot's descriptor set at its set index
    ///
    /// # Errors
    ///
    /// Returns an error if a slot has no resource.
    pub fn bind(&self, cmd: &mut dyn CommandBuffer) -> Result<()> {
        for name in &self.bind_order {
            let slot = &self.slots[name];
            if slot.resource.is_none() {
                engine_bail_invalid!("x2::Material",
                    "Slot '{}' of shader '{}' has no resource", name, self.shader.name());
            }
            cmd.bind_descriptor_set(self.shader.pipeline(), slot.descriptor.set, slot.descriptor_set.gpu_set())?;
        }
        Ok(())
    }

    fn typed_slot(&self, name: &str, expected: ShaderSlotType) -> Result<&MaterialSlot> {
        let slot = self.slots.get(name).ok_or_else(|| engine_err_invalid!("x2::Material",
            "Shader '{}' has no slot '{}'", self.shader.name(), name))?;
        if slot.descriptor.slot_type != expected {
            engine_bail_invalid!("x2::Material",
                "Slot '{}' is {:?}, not {:?}", name, slot.descriptor.slot_type, expected);
        }
        Ok(slot)
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
