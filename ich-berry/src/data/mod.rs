use std::path::Path;

use ndarray::{Array3, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{PrepError, Result};
use crate::Idx3d;

pub mod window;

pub use window::IntensityWindow;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 3D CT nii 文件 header 的共用属性.
///
/// 数据始终按 nifti 原生的 `(X, Y, Z)` 顺序访问, 因为下游张量的形状就是 `(H, W, S)`.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取单个体素分辨率, 以毫米为单位, 按 `[x, y, z]` 排列.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, x, y, z, ..] = self.header().pixdim;
        [x as f64, y as f64, z as f64]
    }

    /// 获取 x 方向体素分辨率, 以毫米为单位.
    ///
    /// 水平切片像素默认是正方形的, 因此平面方向只读取该值.
    #[inline]
    fn x_mm(&self) -> f64 {
        self.header().pixdim[1] as f64
    }

    /// 获取 z 方向 (相邻 2D 切片的方向) 体素分辨率, 以毫米为单位.
    #[inline]
    fn z_mm(&self) -> f64 {
        self.header().pixdim[3] as f64
    }

    /// 获取 header 记录的原始切片个数.
    #[inline]
    fn native_slices(&self) -> usize {
        self.header().dim[3] as usize
    }
}

/// 从 nifti 文件读入的原始体数据, 包括 header 和强度值. 强度值以 `f64` 保存.
///
/// 该结构只作为归一化流程的输入, 归一化会按值消费它,
/// 因此同一病例的原始缓冲区不会在流程结束后继续存活.
#[derive(Debug, Clone)]
pub struct RawVolume {
    header: BoxedHeader,
    data: Array3<f64>,
}

impl NiftiHeaderAttr for RawVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl RawVolume {
    /// 打开 nii (或 nii.gz) 文件格式的 3D 扫描或标注. `path` 为文件的本地路径.
    ///
    /// header 中的 `scl_slope`/`scl_inter` 会被应用. 末维为 1 的 4D 文件按 3D 处理.
    /// 无法解析、维度不符或体素分辨率无意义时返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let nifti_err = |source| PrepError::Nifti {
            path: path.to_owned(),
            source,
        };

        let obj = ReaderOptions::new().read_file(path).map_err(nifti_err)?;
        let header = Box::new(obj.header().clone());
        let data = obj.into_volume().into_ndarray::<f64>().map_err(nifti_err)?;

        let shape = data.shape().to_vec();
        let data = match shape.as_slice() {
            [_, _, _] => data,
            [_, _, _, 1] => data.index_axis_move(Axis(3), 0),
            _ => {
                return Err(PrepError::NotAVolume {
                    path: path.to_owned(),
                    shape,
                })
            }
        };
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| PrepError::NotAVolume {
                path: path.to_owned(),
                shape,
            })?;

        // nifti 数据是列优先的, 统一转成标准布局, 以便后续按 lane 迭代.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };

        Self::from_parts(header, data).map_err(|e| match e {
            PrepError::DegenerateGeometry(msg) => {
                PrepError::DegenerateGeometry(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// 根据 header 和裸数据直接创建 `RawVolume`. `data` 按 `(X, Y, Z)` 组织.
    ///
    /// 体素分辨率非正或无意义时返回 [`PrepError::DegenerateGeometry`].
    pub fn from_parts(header: BoxedHeader, data: Array3<f64>) -> Result<Self> {
        let ans = Self { header, data };
        if let Some(bad) = ans.pix_dim().into_iter().find(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(PrepError::DegenerateGeometry(format!("体素分辨率 {bad} 无意义")));
        }
        Ok(ans)
    }

    /// 根据裸数据和体素分辨率 `[x, y, z]` (毫米) 创建 `RawVolume`, 主要用于实验和测试.
    ///
    /// # 注意
    ///
    /// 体素分辨率非正时程序 panic.
    pub fn fake(data: Array3<f64>, pix_dim: [f32; 3]) -> Self {
        let mut header = Box::<NiftiHeader>::default();
        let (x, y, z) = data.dim();
        header.dim = [3, x as u16, y as u16, z as u16, 1, 1, 1, 1];
        let [_, px, py, pz, ..] = &mut header.pixdim;
        (*px, *py, *pz) = (pix_dim[0], pix_dim[1], pix_dim[2]);
        header.intent_name[..4].copy_from_slice(b"fake");
        Self::from_parts(header, data).expect("体素分辨率必须为正")
    }

    /// 获取数据形状大小, 按 `(X, Y, Z)` 排列.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// 拆出底层数据, 同时返回体素分辨率 `[x, y, z]`.
    #[inline]
    pub fn into_parts(self) -> (Array3<f64>, [f64; 3]) {
        let pix_dim = self.pix_dim();
        (self.data, pix_dim)
    }
}
