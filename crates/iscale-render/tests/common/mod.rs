#![allow(dead_code)]

use iscale_image::sample::byte_to_frac;
use iscale_image::{Polarity, SampleSlice, SampleSliceMut, FRAC_1};
use iscale_render::{
    ColorIndex, ColorInfo, ColorLink, ColorSpace, Device, DeviceColor, DeviceError, ProfileInfo,
    RemapError, RenderingParams,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pack 8-bit components into a color index, first component highest.
pub fn pack(bytes: impl IntoIterator<Item = u64>) -> ColorIndex {
    bytes.into_iter().fold(0, |acc, b| (acc << 8) | b)
}

fn frac_byte(v: u16) -> u64 {
    (v.min(FRAC_1) as u64 * 255 + FRAC_1 as u64 / 2) / FRAC_1 as u64
}

/// A recorded device fill.
#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
    Run {
        x: i64,
        y: i64,
        width: usize,
        color: ColorIndex,
    },
    Composite {
        x: i64,
        y: i64,
        color: DeviceColor,
    },
}

impl Fill {
    pub fn x(&self) -> i64 {
        match self {
            Fill::Run { x, .. } | Fill::Composite { x, .. } => *x,
        }
    }

    pub fn y(&self) -> i64 {
        match self {
            Fill::Run { y, .. } | Fill::Composite { y, .. } => *y,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Fill::Run { width, .. } => *width,
            Fill::Composite { .. } => 1,
        }
    }
}

/// Transform link behavior handed out by [`MockDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Identity,
    Invert,
}

pub struct MockLink(pub LinkKind);

impl ColorLink for MockLink {
    fn is_identity(&self) -> bool {
        self.0 == LinkKind::Identity
    }

    fn map_buffer(
        &self,
        src: SampleSlice<'_>,
        dst: SampleSliceMut<'_>,
        pixels: usize,
        src_components: usize,
        dst_components: usize,
    ) {
        let invert = self.0 == LinkKind::Invert;
        match (src, dst) {
            (SampleSlice::U8(src), SampleSliceMut::U8(dst)) => {
                for p in 0..pixels {
                    for c in 0..dst_components {
                        let v = src[p * src_components + c.min(src_components - 1)];
                        dst[p * dst_components + c] = if invert { 255 - v } else { v };
                    }
                }
            }
            (SampleSlice::U16(src), SampleSliceMut::U16(dst)) => {
                for p in 0..pixels {
                    for c in 0..dst_components {
                        let v = src[p * src_components + c.min(src_components - 1)];
                        dst[p * dst_components + c] = if invert { 0xffff - v } else { v };
                    }
                }
            }
            _ => {}
        }
    }
}

/// A device recording every fill.
pub struct MockDevice {
    pub info: ColorInfo,
    pub profile_components: usize,
    pub halftone: bool,
    pub transfer: bool,
    pub link: Option<LinkKind>,
    pub fail_after: Option<usize>,
    pub fills: Vec<Fill>,
}

impl MockDevice {
    /// A contone device with `components` 8-bit channels.
    pub fn contone(components: usize) -> Self {
        Self {
            info: ColorInfo {
                num_components: components,
                max_gray: 255,
                max_color: 255,
                polarity: if components == 4 {
                    Polarity::Subtractive
                } else {
                    Polarity::Additive
                },
                depth: 8 * components as u32,
            },
            profile_components: components,
            halftone: false,
            transfer: false,
            link: Some(LinkKind::Identity),
            fail_after: None,
            fills: Vec::new(),
        }
    }

    /// A one-bit gray device.
    pub fn bilevel() -> Self {
        let mut device = Self::contone(1);
        device.info.max_gray = 1;
        device.info.max_color = 1;
        device.info.depth = 1;
        device.halftone = true;
        device
    }

    /// Fills of device row `y`, ordered by x.
    pub fn row(&self, y: i64) -> Vec<Fill> {
        let mut row: Vec<Fill> = self.fills.iter().filter(|f| f.y() == y).cloned().collect();
        row.sort_by_key(Fill::x);
        row
    }

    /// Distinct device rows written, in first-write order.
    pub fn rows(&self) -> Vec<i64> {
        let mut rows = Vec::new();
        for fill in &self.fills {
            if !rows.contains(&fill.y()) {
                rows.push(fill.y());
            }
        }
        rows
    }

    fn record(&mut self, fill: Fill) -> Result<(), DeviceError> {
        if self.fail_after.is_some_and(|n| self.fills.len() >= n) {
            return Err(DeviceError("device full".into()));
        }
        self.fills.push(fill);
        Ok(())
    }
}

impl Device for MockDevice {
    fn color_info(&self) -> ColorInfo {
        self.info
    }

    fn profile_components(&self) -> usize {
        self.profile_components
    }

    fn must_halftone(&self) -> bool {
        self.halftone
    }

    fn has_transfer(&self) -> bool {
        self.transfer
    }

    fn encode_color(&self, values: &[u16]) -> Option<ColorIndex> {
        Some(pack(values.iter().map(|&v| (v >> 8) as u64)))
    }

    fn transfer_halftone(&self, values: &[u16], _transfer: bool, _halftone: bool) -> DeviceColor {
        DeviceColor::Composite(values.to_vec())
    }

    fn fill_run(
        &mut self,
        x: i64,
        y: i64,
        width: usize,
        color: ColorIndex,
    ) -> Result<(), DeviceError> {
        self.record(Fill::Run { x, y, width, color })
    }

    fn fill_composite(&mut self, x: i64, y: i64, color: &DeviceColor) -> Result<(), DeviceError> {
        self.record(Fill::Composite {
            x,
            y,
            color: color.clone(),
        })
    }

    fn build_color_link(
        &self,
        _source: &dyn ColorSpace,
        _params: &RenderingParams,
    ) -> Option<Box<dyn ColorLink>> {
        self.link
            .map(|kind| Box::new(MockLink(kind)) as Box<dyn ColorLink>)
    }
}

/// A device gray, RGB or CMYK space.
pub struct DeviceSpace(pub usize);

impl ColorSpace for DeviceSpace {
    fn num_components(&self) -> usize {
        self.0
    }

    fn is_device_accurate(&self) -> bool {
        true
    }

    fn remap_color(&self, values: &[f32], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Ok(DeviceColor::Pure(pack(
            values
                .iter()
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u64),
        )))
    }

    fn remap_concrete_color(
        &self,
        values: &[u16],
        _: &dyn Device,
    ) -> Result<DeviceColor, RemapError> {
        Ok(DeviceColor::Pure(pack(values.iter().map(|&v| frac_byte(v)))))
    }
}

/// A space carrying an embedded profile.
pub struct IccSpace {
    pub components: usize,
    pub lab: bool,
}

impl ColorSpace for IccSpace {
    fn num_components(&self) -> usize {
        self.components
    }

    fn profile(&self) -> Option<ProfileInfo> {
        Some(ProfileInfo {
            num_components: self.components,
            is_lab: self.lab,
        })
    }

    fn is_device_accurate(&self) -> bool {
        false
    }

    fn remap_color(&self, _: &[f32], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Err(RemapError("profile spaces go through the link".into()))
    }

    fn remap_concrete_color(&self, _: &[u16], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Err(RemapError("profile spaces go through the link".into()))
    }
}

/// A CIE-based space, or a Lab-encoded one, remapping float components.
pub struct CieSpace {
    pub components: usize,
    pub lab: bool,
}

impl ColorSpace for CieSpace {
    fn num_components(&self) -> usize {
        self.components
    }

    fn profile(&self) -> Option<ProfileInfo> {
        self.lab.then_some(ProfileInfo {
            num_components: self.components,
            is_lab: true,
        })
    }

    fn is_cie(&self) -> bool {
        !self.lab
    }

    fn is_device_accurate(&self) -> bool {
        false
    }

    fn remap_color(&self, values: &[f32], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Ok(DeviceColor::Pure(pack(
            values
                .iter()
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u64),
        )))
    }

    fn remap_concrete_color(&self, _: &[u16], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Err(RemapError("CIE samples are remapped as floats".into()))
    }
}

pub const PALETTE: [[u8; 3]; 4] = [[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]];

/// A four-entry palette over device RGB.
pub struct Palette {
    pub base: DeviceSpace,
}

impl Palette {
    pub fn rgb() -> Self {
        Self {
            base: DeviceSpace(3),
        }
    }

    fn entry(index: f32) -> &'static [u8; 3] {
        &PALETTE[(index.round().max(0.0) as usize).min(PALETTE.len() - 1)]
    }
}

impl ColorSpace for Palette {
    fn num_components(&self) -> usize {
        1
    }

    fn base_space(&self) -> Option<&dyn ColorSpace> {
        Some(&self.base)
    }

    fn is_device_accurate(&self) -> bool {
        false
    }

    fn remap_color(&self, _: &[f32], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Err(RemapError("palette entries are resolved before remapping".into()))
    }

    fn remap_concrete_color(&self, _: &[u16], _: &dyn Device) -> Result<DeviceColor, RemapError> {
        Err(RemapError("palette entries are resolved before remapping".into()))
    }

    fn lookup_index_bytes(&self, index: f32, out: &mut [u8]) {
        out.copy_from_slice(Self::entry(index));
    }

    fn lookup_index_frac(&self, index: f32, out: &mut [u16]) {
        for (o, &b) in out.iter_mut().zip(Self::entry(index)) {
            *o = byte_to_frac(b);
        }
    }
}
