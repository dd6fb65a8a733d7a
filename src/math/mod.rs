//! 数学库模块
//!
//! 基于 `nalgebra`，提供 Direct3D 约定（左手坐标系、深度范围 0..1）的投影矩阵。
//!
//! 矩阵按 nalgebra 的列向量约定存储（`M * v`）。
//! 上传到 HLSL 的行主序常量缓冲时取转置即可与 DirectXMath 的结果一致。

pub use nalgebra::{Matrix4 as Mat4, Vector4 as Vec4};

pub type Matrix4 = Mat4<f32>;
pub type Vector4 = Vec4<f32>;

/// 颜色类型（RGBA，范围 0.0-1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// 创建新的颜色
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const GRAY: Color = Color { r: 0.5, g: 0.5, b: 0.5, a: 1.0 };
}

impl From<[f32; 4]> for Color {
    fn from(rgba: [f32; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }
}

/// 数学常量
pub mod constants {
    /// π/4，透视投影使用的垂直视场角
    pub const QUARTER_PI: f32 = std::f32::consts::FRAC_PI_4;
}

/// 矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 单位矩阵
    pub fn identity() -> Matrix4 {
        Matrix4::identity()
    }

    /// 左手透视投影矩阵（等价于 `XMMatrixPerspectiveFovLH`）
    ///
    /// 视空间 z = near 映射到深度 0，z = far 映射到深度 1。
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect;
        let range = far / (far - near);

        Matrix4::new(
            x_scale, 0.0, 0.0, 0.0,
            0.0, y_scale, 0.0, 0.0,
            0.0, 0.0, range, -range * near,
            0.0, 0.0, 1.0, 0.0,
        )
    }

    /// 左手正交投影矩阵（等价于 `XMMatrixOrthographicLH`），以原点为中心
    pub fn orthographic_lh(width: f32, height: f32, near: f32, far: f32) -> Matrix4 {
        let range = 1.0 / (far - near);

        Matrix4::new(
            2.0 / width, 0.0, 0.0, 0.0,
            0.0, 2.0 / height, 0.0, 0.0,
            0.0, 0.0, range, -range * near,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}
