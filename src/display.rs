use crate::renderer::Framebuffer;
use crossterm::style::{self, Stylize};
use std::io::{self, Write};

/// Terminal encodings for the rendered frame. Pixel data stays linear; the
/// terminal is assumed to want exactly what the framebuffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// ANSI 24-bit true-color full blocks, one pixel per cell.
    TrueColor,
    /// Half-block rendering with separate fg/bg colors — two vertical pixels
    /// per cell.
    HalfBlock,
    /// ASCII grayscale density ramp.
    Ascii,
    /// Unicode braille patterns: a 2×4 dot matrix per cell, colored by the
    /// average of its lit pixels.
    Braille,
}

pub fn display_framebuffer(fb: &Framebuffer, mode: DisplayMode) {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    match mode {
        DisplayMode::TrueColor => display_truecolor(&mut out, fb),
        DisplayMode::HalfBlock => display_halfblock(&mut out, fb),
        DisplayMode::Ascii => display_ascii(&mut out, fb),
        DisplayMode::Braille => display_braille(&mut out, fb),
    }
    let _ = out.flush();
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b)) / 255.0
}

fn display_truecolor(out: &mut impl Write, fb: &Framebuffer) {
    for y in 0..fb.height {
        for x in 0..fb.width {
            let (r, g, b) = fb.rgb_at(x, y);
            let _ = write!(out, "{}", "█".with(style::Color::Rgb { r, g, b }));
        }
        let _ = writeln!(out);
    }
}

fn display_halfblock(out: &mut impl Write, fb: &Framebuffer) {
    let rows = fb.height / 2;
    for row in 0..rows {
        for x in 0..fb.width {
            let (tr, tg, tb) = fb.rgb_at(x, row * 2);
            let (br, bg, bb) = fb.rgb_at(x, row * 2 + 1);
            let _ = write!(
                out,
                "{}",
                "▀"
                    .with(style::Color::Rgb { r: tr, g: tg, b: tb })
                    .on(style::Color::Rgb { r: br, g: bg, b: bb })
            );
        }
        let _ = writeln!(out);
    }
}

fn display_ascii(out: &mut impl Write, fb: &Framebuffer) {
    const RAMP: &[u8] = b" .:-=+*#%@";
    for y in 0..fb.height {
        for x in 0..fb.width {
            let (r, g, b) = fb.rgb_at(x, y);
            let lum = luminance(r, g, b);
            let idx = (lum.clamp(0.0, 0.999) * RAMP.len() as f32) as usize;
            let _ = write!(out, "{}", RAMP[idx] as char);
        }
        let _ = writeln!(out);
    }
}

/// Braille cells encode a 2×4 dot matrix (U+2800 block). Dots light up above
/// a luminance threshold; the cell takes the average color of its lit dots.
fn display_braille(out: &mut impl Write, fb: &Framebuffer) {
    const OFFSETS: [(u32, u32, u8); 8] = [
        (0, 0, 0),
        (0, 1, 1),
        (0, 2, 2),
        (1, 0, 3),
        (1, 1, 4),
        (1, 2, 5),
        (0, 3, 6),
        (1, 3, 7),
    ];

    let cols = fb.width / 2;
    let rows = fb.height / 4;
    for row in 0..rows {
        for col in 0..cols {
            let mut pattern: u8 = 0;
            let mut sum = (0u32, 0u32, 0u32);
            let mut lit = 0u32;

            for &(dx, dy, bit) in &OFFSETS {
                let px = col * 2 + dx;
                let py = row * 4 + dy;
                if px < fb.width && py < fb.height {
                    let (r, g, b) = fb.rgb_at(px, py);
                    if luminance(r, g, b) > 0.15 {
                        pattern |= 1 << bit;
                        sum.0 += u32::from(r);
                        sum.1 += u32::from(g);
                        sum.2 += u32::from(b);
                        lit += 1;
                    }
                }
            }

            let (r, g, b) = if lit > 0 {
                ((sum.0 / lit) as u8, (sum.1 / lit) as u8, (sum.2 / lit) as u8)
            } else {
                (0, 0, 0)
            };
            let braille = char::from_u32(0x2800 + u32::from(pattern)).unwrap_or(' ');
            let _ = write!(
                out,
                "{}",
                braille.to_string().with(style::Color::Rgb { r, g, b })
            );
        }
        let _ = writeln!(out);
    }
}
