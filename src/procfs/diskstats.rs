use {
    super::parse_field,
    crate::{
        sample::{Counters, EntityId},
        source::{Record, RecordError, Sample, Schema, SourceError},
    },
    std::io::BufRead,
};

/// devices that are not physical disks.
const IGNORED: [&str; 4] = ["loop", "ram", "sr", "zram"];

/// the fewest fields a line may carry; linux 2.6 reports fourteen.
const REQUIRED: usize = 14;

/// the size of a sector, in bytes. the kernel always counts 512-byte sectors here.
const SECTOR: u64 = 512;

pub fn schema() -> Schema {
    ["reads", "read_bytes", "writes", "write_bytes", "io_ticks"]
        .into_iter()
        .collect()
}

/// reads a sample of every block device.
pub fn read(diskstats: impl BufRead) -> Result<Sample, SourceError> {
    let mut sample = Sample::new();

    for line in diskstats.lines() {
        let line = line?;
        let fields = line.split_whitespace().collect::<Vec<_>>();
        let Some(device) = fields.get(2) else {
            continue;
        };
        if IGNORED.iter().any(|prefix| device.starts_with(prefix)) {
            continue;
        }

        sample.insert(EntityId::from(*device), parse(&fields));
    }

    Ok(sample)
}

/// parses the fields of one device's line.
///
/// see the kernel's `Documentation/admin-guide/iostats.rst` for the layout.
fn parse(fields: &[&str]) -> Record {
    if fields.len() < REQUIRED {
        return Err(RecordError::Truncated {
            found: fields.len(),
            expected: REQUIRED,
        });
    }

    let field = |name: &str, index: usize| parse_field(name, fields[index]);

    Ok(Counters::from([
        ("reads", field("reads", 3)?),
        ("read_bytes", field("sectors read", 5)?.saturating_mul(SECTOR)),
        ("writes", field("writes", 7)?),
        ("write_bytes", field("sectors written", 9)?.saturating_mul(SECTOR)),
        ("io_ticks", field("io ticks", 12)?),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "\
   7       0 loop0 52 0 2168 17 0 0 0 0 0 44 17 0 0 0 0 0 0
   8       0 sda 12000 500 960000 4000 3000 200 48000 1500 0 5200 5500 0 0 0 0 0 0
   8       1 sda1 11000 500 950000 3900 3000 200 48000 1500 0 5100 5400
 253       0 zram0 10 0 80 0 0 0 0 0 0 0 0
 259       0 nvme0n1 1 2 3
";

    #[test]
    fn ignores_virtual_devices() {
        let sample = read(DISKSTATS.as_bytes()).unwrap();
        let ids = sample.keys().map(EntityId::as_str).collect::<Vec<_>>();
        assert_eq!(ids, ["nvme0n1", "sda", "sda1"]);
    }

    #[test]
    fn counters() {
        let sample = read(DISKSTATS.as_bytes()).unwrap();
        let sda = sample.get("sda").unwrap().as_ref().unwrap();
        assert_eq!(sda.get("reads"), 12000);
        assert_eq!(sda.get("read_bytes"), 960000 * 512);
        assert_eq!(sda.get("writes"), 3000);
        assert_eq!(sda.get("write_bytes"), 48000 * 512);
        assert_eq!(sda.get("io_ticks"), 5200);
    }

    #[test]
    fn short_line_is_a_bad_record() {
        let sample = read(DISKSTATS.as_bytes()).unwrap();
        assert_eq!(
            sample.get("nvme0n1").unwrap(),
            &Err(RecordError::Truncated {
                found: 6,
                expected: 14
            })
        );
    }

    #[test]
    fn bad_field() {
        let err = parse(&"8 0 sda x 0 0 0 0 0 0 0 0 0 0".split(' ').collect::<Vec<_>>());
        assert!(matches!(err, Err(RecordError::Field { name, .. }) if name == "reads"));
    }
}
