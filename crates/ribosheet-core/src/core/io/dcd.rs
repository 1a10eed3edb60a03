//! CHARMM/NAMD DCD trajectories: Fortran-style little-endian records holding a header, then
//! per frame an optional unit cell followed by X[N], Y[N] and Z[N] as `f32` arrays.

use crate::core::models::frame::{Frame, PeriodicBox};
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

const HEADER_CONTROL_BYTES: usize = 84;
const CHARMM_VERSION: i32 = 24;
// Byte offset of icntrl[0] (frame count): record marker + "CORD".
const FRAME_COUNT_OFFSET: u64 = 8;
const STEP_COUNT_OFFSET: u64 = FRAME_COUNT_OFFSET + 12;

#[derive(Debug, Error)]
pub enum DcdError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid DCD data: {0}")]
    InvalidData(String),
    #[error("Frame has {found} atoms but the trajectory holds {expected}")]
    AtomCountMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DcdHeader {
    pub frame_count: u32,
    pub atom_count: u32,
    pub start_step: u32,
    pub step_interval: u32,
    pub timestep: f32,
    pub has_unit_cell: bool,
    pub has_four_dims: bool,
    pub title: String,
}

fn write_record(w: &mut impl Write, payload: &[u8]) -> io::Result<()> {
    let size = payload.len() as i32;
    w.write_all(&size.to_le_bytes())?;
    w.write_all(payload)?;
    w.write_all(&size.to_le_bytes())
}

/// Streaming writer. The header frame count is patched on [`DcdWriter::finish`].
pub struct DcdWriter<W: Write + Seek> {
    writer: W,
    atom_count: usize,
    step_interval: u32,
    frames_written: u32,
}

impl DcdWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(
        path: P,
        atom_count: usize,
        step_interval: u32,
        timestep: f32,
    ) -> Result<Self, DcdError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), atom_count, step_interval, timestep)
    }
}

impl<W: Write + Seek> DcdWriter<W> {
    pub fn new(
        mut writer: W,
        atom_count: usize,
        step_interval: u32,
        timestep: f32,
    ) -> Result<Self, DcdError> {
        let mut control = Vec::with_capacity(HEADER_CONTROL_BYTES);
        control.extend_from_slice(b"CORD");
        let mut icntrl = [0i32; 20];
        icntrl[1] = step_interval as i32;
        icntrl[2] = step_interval as i32;
        icntrl[9] = timestep.to_bits() as i32;
        icntrl[10] = 1;
        icntrl[19] = CHARMM_VERSION;
        for value in icntrl {
            control.extend_from_slice(&value.to_le_bytes());
        }
        write_record(&mut writer, &control)?;

        let mut title = Vec::with_capacity(4 + 80);
        title.extend_from_slice(&1i32.to_le_bytes());
        title.extend_from_slice(format!("{:<80}", "Created by ribosheet").as_bytes());
        write_record(&mut writer, &title)?;

        write_record(&mut writer, &(atom_count as i32).to_le_bytes())?;

        Ok(Self {
            writer,
            atom_count,
            step_interval,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn write_frame(
        &mut self,
        positions: &[Point3<f64>],
        periodic_box: Option<&PeriodicBox>,
    ) -> Result<(), DcdError> {
        if positions.len() != self.atom_count {
            return Err(DcdError::AtomCountMismatch {
                expected: self.atom_count,
                found: positions.len(),
            });
        }
        // Unit cell as (a, gamma, b, beta, alpha, c).
        let cell = periodic_box.map_or([0.0; 6], |c| [c.a, 90.0, c.b, 90.0, 90.0, c.c]);
        let cell_bytes: Vec<u8> = cell.iter().flat_map(|v| v.to_le_bytes()).collect();
        write_record(&mut self.writer, &cell_bytes)?;

        for axis in 0..3 {
            let bytes: Vec<u8> = positions
                .iter()
                .flat_map(|p| (p[axis] as f32).to_le_bytes())
                .collect();
            write_record(&mut self.writer, &bytes)?;
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Patches the frame and step counts into the header and flushes the stream.
    pub fn finish(mut self) -> Result<W, DcdError> {
        let position = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
        self.writer
            .write_all(&(self.frames_written as i32).to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(STEP_COUNT_OFFSET))?;
        let steps = self.frames_written.saturating_mul(self.step_interval);
        self.writer.write_all(&(steps as i32).to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(position))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Streaming reader over any `Read + Seek` source.
pub struct DcdReader<R: Read + Seek> {
    reader: R,
    header: DcdHeader,
    frames_read: u32,
}

impl DcdReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DcdError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> DcdReader<R> {
    pub fn new(mut reader: R) -> Result<Self, DcdError> {
        let header = parse_header(&mut reader)?;
        Ok(Self {
            reader,
            header,
            frames_read: 0,
        })
    }

    pub fn header(&self) -> &DcdHeader {
        &self.header
    }

    /// Reads the next frame, or `None` once every frame declared in the header was read.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, DcdError> {
        if self.frames_read >= self.header.frame_count {
            return Ok(None);
        }
        let n = self.header.atom_count as usize;

        let periodic_box = if self.header.has_unit_cell {
            let cell = read_record(&mut self.reader)?;
            if cell.len() != 48 {
                return Err(DcdError::InvalidData(format!(
                    "unit cell record: expected 48 bytes, got {}",
                    cell.len()
                )));
            }
            let values: Vec<f64> = cell
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            let cell = PeriodicBox::new(values[0], values[2], values[5]);
            cell.is_valid().then_some(cell)
        } else {
            None
        };

        let x = read_f32_record(&mut self.reader, n)?;
        let y = read_f32_record(&mut self.reader, n)?;
        let z = read_f32_record(&mut self.reader, n)?;
        if self.header.has_four_dims {
            read_record(&mut self.reader)?;
        }
        self.frames_read += 1;

        let positions = (0..n)
            .map(|i| Point3::new(x[i] as f64, y[i] as f64, z[i] as f64))
            .collect();
        Ok(Some(Frame::new(positions, periodic_box)))
    }

    /// Reads up to `max_frames` frames. An empty chunk means the trajectory is exhausted.
    pub fn read_chunk(&mut self, max_frames: usize) -> Result<Vec<Frame>, DcdError> {
        let mut frames = Vec::with_capacity(max_frames.min(1024));
        while frames.len() < max_frames {
            match self.read_frame()? {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        Ok(frames)
    }
}

fn read_i32(r: &mut impl Read) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_record(r: &mut impl Read) -> Result<Vec<u8>, DcdError> {
    let size = read_i32(r)?;
    if size < 0 {
        return Err(DcdError::InvalidData(format!(
            "negative record size: {size}"
        )));
    }
    let mut buf = vec![0u8; size as usize];
    r.read_exact(&mut buf)?;
    let end_size = read_i32(r)?;
    if size != end_size {
        return Err(DcdError::InvalidData(format!(
            "record size mismatch: start={size}, end={end_size}"
        )));
    }
    Ok(buf)
}

fn read_f32_record(r: &mut impl Read, n: usize) -> Result<Vec<f32>, DcdError> {
    let data = read_record(r)?;
    if data.len() != n * 4 {
        return Err(DcdError::InvalidData(format!(
            "coordinate record: expected {} bytes, got {}",
            n * 4,
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn parse_header(r: &mut impl Read) -> Result<DcdHeader, DcdError> {
    let control = read_record(r)?;
    if control.len() != HEADER_CONTROL_BYTES {
        return Err(DcdError::InvalidData(format!(
            "header record: expected {HEADER_CONTROL_BYTES} bytes, got {}",
            control.len()
        )));
    }
    if &control[0..4] != b"CORD" {
        return Err(DcdError::InvalidData("missing CORD magic".into()));
    }
    let icntrl: Vec<i32> = control[4..]
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let title_record = read_record(r)?;
    let title = if title_record.len() >= 4 {
        let lines = i32::from_le_bytes([
            title_record[0],
            title_record[1],
            title_record[2],
            title_record[3],
        ])
        .max(0) as usize;
        (0..lines)
            .filter_map(|i| title_record.get(4 + i * 80..4 + (i + 1) * 80))
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        String::new()
    };

    let atoms = read_record(r)?;
    if atoms.len() != 4 {
        return Err(DcdError::InvalidData(format!(
            "atom count record: expected 4 bytes, got {}",
            atoms.len()
        )));
    }

    Ok(DcdHeader {
        frame_count: icntrl[0].max(0) as u32,
        atom_count: i32::from_le_bytes([atoms[0], atoms[1], atoms[2], atoms[3]]).max(0) as u32,
        start_step: icntrl[1].max(0) as u32,
        step_interval: icntrl[2].max(0) as u32,
        timestep: f32::from_bits(icntrl[9] as u32),
        has_unit_cell: icntrl[10] != 0,
        has_four_dims: icntrl[11] != 0,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame_positions(shift: f64) -> Vec<Point3<f64>> {
        vec![
            Point3::new(1.0 + shift, 2.0, 3.0),
            Point3::new(-4.5, 0.25 + shift, 9.0),
        ]
    }

    #[test]
    fn writer_patches_frame_count_and_reader_streams_frames() {
        let cell = PeriodicBox::new(25.0, 35.0, 65.0);
        let mut writer = DcdWriter::new(Cursor::new(Vec::new()), 2, 500, 0.004).unwrap();
        for i in 0..3 {
            writer.write_frame(&frame_positions(i as f64), Some(&cell)).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();

        let mut reader = DcdReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.header().frame_count, 3);
        assert_eq!(reader.header().atom_count, 2);
        assert_eq!(reader.header().step_interval, 500);
        assert!(reader.header().has_unit_cell);

        let first = reader.read_chunk(2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].positions[0], Point3::new(2.0, 2.0, 3.0));
        assert_eq!(first[0].periodic_box, Some(cell));

        let rest = reader.read_chunk(2).unwrap();
        assert_eq!(rest.len(), 1);
        assert!((rest[0].positions[1].y - 2.25).abs() < 1e-6);
        assert!(reader.read_chunk(2).unwrap().is_empty());
    }

    #[test]
    fn frames_without_box_have_no_periodic_box() {
        let mut writer = DcdWriter::new(Cursor::new(Vec::new()), 2, 1, 0.002).unwrap();
        writer.write_frame(&frame_positions(0.0), None).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let mut reader = DcdReader::new(Cursor::new(bytes)).unwrap();
        let frame = reader.read_frame().unwrap().unwrap();
        assert!(frame.periodic_box.is_none());
    }

    #[test]
    fn write_frame_rejects_wrong_atom_count() {
        let mut writer = DcdWriter::new(Cursor::new(Vec::new()), 3, 1, 0.002).unwrap();
        let result = writer.write_frame(&frame_positions(0.0), None);
        assert!(matches!(
            result,
            Err(DcdError::AtomCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn garbage_input_is_rejected() {
        let result = DcdReader::new(Cursor::new(vec![4, 0, 0, 0, b'X', b'Y', b'Z', b'W', 4, 0, 0, 0]));
        assert!(matches!(result, Err(DcdError::InvalidData(_))));
    }
}
