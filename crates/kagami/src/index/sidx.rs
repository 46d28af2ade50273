//! ISO BMFF segment index (`sidx`) box parsing.
//!
//! Only the top level of the buffer is walked. Fragmented MP4 files as served
//! by adaptive-streaming hosts place `sidx` right after `moov`, so the buffer
//! `0..=index_end` always ends with it.

use bytes::Buf;

use crate::error::{KagamiError, KagamiResult};

const SIDX: &[u8; 4] = b"sidx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentIndexBox {
    pub version: u8,
    pub reference_id: u32,
    /// Ticks per second.
    pub timescale: u32,
    pub earliest_presentation_time: u64,
    pub first_offset: u64,
    pub references: Vec<SidxReference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidxReference {
    /// `true` when the reference points at another `sidx` rather than media.
    pub reference_type: bool,
    pub referenced_size: u32,
    /// Duration in `timescale` ticks.
    pub subsegment_duration: u32,
    pub starts_with_sap: bool,
    pub sap_type: u8,
    pub sap_delta_time: u32,
}

/// Walk the top-level boxes of `data` and parse the first `sidx` found.
pub fn find_sidx(data: &[u8]) -> KagamiResult<SegmentIndexBox> {
    let mut cursor = data;

    while cursor.len() >= 8 {
        let mut header = cursor;
        let size32 = header.get_u32();
        let mut box_type = [0u8; 4];
        header.copy_to_slice(&mut box_type);

        let (size, header_size) = match size32 {
            // Box extends to the end of the buffer.
            0 => (cursor.len() as u64, 8u64),
            1 => {
                if header.remaining() < 8 {
                    return Err(KagamiError::InvalidSidx(
                        "truncated 64-bit box size".to_string(),
                    ));
                }
                (header.get_u64(), 16u64)
            }
            size => (size as u64, 8u64),
        };

        if size < header_size {
            return Err(KagamiError::InvalidSidx(format!(
                "box {} declares size {size}, smaller than its header",
                String::from_utf8_lossy(&box_type)
            )));
        }

        if &box_type == SIDX {
            let end = usize::try_from(size)
                .map_err(|_| KagamiError::InvalidSidx(format!("box size {size} too large")))?;
            if end > cursor.len() {
                return Err(KagamiError::InvalidSidx(format!(
                    "sidx declares {end} bytes, only {} available",
                    cursor.len()
                )));
            }
            return parse_sidx(&cursor[header_size as usize..end]);
        }

        match usize::try_from(size) {
            Ok(size) if size <= cursor.len() => cursor = &cursor[size..],
            _ => break,
        }
    }

    Err(KagamiError::SidxNotFound(data.len()))
}

/// Parse the content of a `sidx` box, header excluded.
pub fn parse_sidx(mut body: &[u8]) -> KagamiResult<SegmentIndexBox> {
    ensure_remaining(body, 12)?;
    let version = body.get_u8();
    body.advance(3); // flags
    let reference_id = body.get_u32();
    let timescale = body.get_u32();
    if timescale == 0 {
        return Err(KagamiError::InvalidSidx("timescale is zero".to_string()));
    }

    let (earliest_presentation_time, first_offset) = match version {
        0 => {
            ensure_remaining(body, 8)?;
            (body.get_u32() as u64, body.get_u32() as u64)
        }
        1 => {
            ensure_remaining(body, 16)?;
            (body.get_u64(), body.get_u64())
        }
        version => {
            return Err(KagamiError::InvalidSidx(format!(
                "unsupported version {version}"
            )))
        }
    };

    ensure_remaining(body, 4)?;
    body.advance(2); // reserved
    let reference_count = body.get_u16() as usize;
    ensure_remaining(body, reference_count * 12)?;

    let references = (0..reference_count)
        .map(|_| {
            let size_word = body.get_u32();
            let subsegment_duration = body.get_u32();
            let sap_word = body.get_u32();
            SidxReference {
                reference_type: size_word >> 31 == 1,
                referenced_size: size_word & 0x7fff_ffff,
                subsegment_duration,
                starts_with_sap: sap_word >> 31 == 1,
                sap_type: ((sap_word >> 28) & 0x7) as u8,
                sap_delta_time: sap_word & 0x0fff_ffff,
            }
        })
        .collect();

    Ok(SegmentIndexBox {
        version,
        reference_id,
        timescale,
        earliest_presentation_time,
        first_offset,
        references,
    })
}

fn ensure_remaining(buf: &[u8], need: usize) -> KagamiResult<()> {
    if buf.remaining() < need {
        return Err(KagamiError::InvalidSidx(format!(
            "need {need} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}
