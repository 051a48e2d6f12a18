/// SPIR-V reflection with spirq
///
/// Produces the engine's `ReflectedModule` from bytecode: stage, entry point,
/// stage inputs/outputs by location, descriptor bindings and push constants.
/// Binding names prefer the variable (instance) name and fall back to the
/// block type name.

use spirq::spirv::{Dim, ExecutionModel};
use spirq::ty::{DescriptorType as SpirqDescriptorType, Type};
use spirq::var::Variable;
use x2_engine::graphics_device::{
    DescriptorType, ImageDim, ReflectedBinding, ReflectedModule, ReflectedPushConstant,
    ReflectedVariable, ShaderStage,
};
use x2_engine::x2::Result;
use x2_engine::{engine_bail_invalid, engine_err_invalid};

use crate::vulkan_context::SOURCE;

/// Decode SPIR-V bytes into words (validates size and endianness)
pub(crate) fn spirv_words(code: &[u8]) -> Result<Vec<u32>> {
    ash::util::read_spv(&mut std::io::Cursor::new(code))
        .map_err(|e| engine_err_invalid!(SOURCE, "Invalid SPIR-V bytecode: {}", e))
}

pub(crate) fn stage_from_exec_model(model: ExecutionModel) -> Option<ShaderStage> {
    match model {
        ExecutionModel::Vertex => Some(ShaderStage::Vertex),
        ExecutionModel::TessellationControl => Some(ShaderStage::TessellationControl),
        ExecutionModel::TessellationEvaluation => Some(ShaderStage::TessellationEvaluation),
        ExecutionModel::Geometry => Some(ShaderStage::Geometry),
        ExecutionModel::Fragment => Some(ShaderStage::Fragment),
        ExecutionModel::GLCompute => Some(ShaderStage::Compute),
        _ => None,
    }
}

pub(crate) fn image_dim_from_spirv(dim: Dim) -> Option<ImageDim> {
    match dim {
        Dim::Dim1D => Some(ImageDim::D1),
        Dim::Dim2D | Dim::DimRect => Some(ImageDim::D2),
        Dim::Dim3D => Some(ImageDim::D3),
        Dim::DimCube => Some(ImageDim::Cube),
        Dim::DimBuffer => Some(ImageDim::Buffer),
        Dim::DimSubpassData => Some(ImageDim::SubpassData),
        _ => None,
    }
}

fn descriptor_type(desc_ty: &SpirqDescriptorType) -> Result<DescriptorType> {
    let descriptor_type = match desc_ty {
        SpirqDescriptorType::Sampler(..) => DescriptorType::Sampler,
        SpirqDescriptorType::CombinedImageSampler(..) => DescriptorType::CombinedImageSampler,
        SpirqDescriptorType::SampledImage(..) => DescriptorType::SampledImage,
        SpirqDescriptorType::StorageImage(..) => DescriptorType::StorageImage,
        SpirqDescriptorType::UniformTexelBuffer(..) => DescriptorType::UniformTexelBuffer,
        SpirqDescriptorType::StorageTexelBuffer(..) => DescriptorType::StorageTexelBuffer,
        SpirqDescriptorType::UniformBuffer(..) => DescriptorType::UniformBuffer,
        SpirqDescriptorType::StorageBuffer(..) => DescriptorType::StorageBuffer,
        SpirqDescriptorType::InputAttachment(..) => DescriptorType::InputAttachment,
        other => engine_bail_invalid!(SOURCE, "Unsupported SPIR-V descriptor type: {:?}", other),
    };
    Ok(descriptor_type)
}

fn image_dim(ty: &Type) -> Option<ImageDim> {
    match ty {
        Type::CombinedImageSampler(t) => image_dim_from_spirv(t.sampled_image_ty.dim),
        Type::SampledImage(t) => image_dim_from_spirv(t.dim),
        Type::StorageImage(t) => image_dim_from_spirv(t.dim),
        Type::SubpassData(_) => Some(ImageDim::SubpassData),
        _ => None,
    }
}

fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Struct(st) => st.name.clone(),
        _ => None,
    }
}

/// Reflect one SPIR-V module (its first entry point)
pub(crate) fn reflect_module(code: &[u8]) -> Result<ReflectedModule> {
    let words = spirv_words(code)?;

    let entry_points = spirq::ReflectConfig::new()
        .spv(words.as_slice())
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err_invalid!(SOURCE, "SPIR-V reflection failed: {:?}", e))?;

    let entry_point = entry_points
        .first()
        .ok_or_else(|| engine_err_invalid!(SOURCE, "SPIR-V module has no entry point"))?;

    let stage = stage_from_exec_model(entry_point.exec_model).ok_or_else(|| {
        engine_err_invalid!(
            SOURCE,
            "Unsupported execution model {:?} for entry point '{}'",
            entry_point.exec_model,
            entry_point.name
        )
    })?;

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut bindings = Vec::new();
    let mut push_constants = Vec::new();

    for var in &entry_point.vars {
        match var {
            Variable::Input { name, location, .. } => inputs.push(ReflectedVariable {
                name: name.clone().unwrap_or_default(),
                location: location.loc(),
            }),
            Variable::Output { name, location, .. } => outputs.push(ReflectedVariable {
                name: name.clone().unwrap_or_default(),
                location: location.loc(),
            }),
            Variable::Descriptor {
                name,
                desc_bind,
                desc_ty,
                ty,
                nbind,
                ..
            } => bindings.push(ReflectedBinding {
                name: name.clone().or_else(|| type_name(ty)).unwrap_or_default(),
                set: desc_bind.set(),
                binding: desc_bind.bind(),
                descriptor_type: descriptor_type(desc_ty)?,
                image_dim: image_dim(ty),
                count: (*nbind).max(1),
            }),
            Variable::PushConstant { ty, .. } => push_constants.push(ReflectedPushConstant {
                offset: 0,
                size: ty.nbyte().unwrap_or(0) as u32,
            }),
            _ => {}
        }
    }

    inputs.sort_by_key(|v| v.location);
    outputs.sort_by_key(|v| v.location);
    bindings.sort_by_key(|b| (b.set, b.binding));

    Ok(ReflectedModule {
        stage,
        entry_point: entry_point.name.clone(),
        inputs,
        outputs,
        bindings,
        push_constants,
    })
}

#[cfg(test)]
#[path = "vulkan_reflection_tests.rs"]
mod tests;
