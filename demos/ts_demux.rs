use tokio::fs::File as AsyncFile;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tslive::{DemuxConfig, DemuxEvent, TsStreamReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "input.ts".to_string());
    let output = args.next().unwrap_or_else(|| "output.aac".to_string());

    // TSLIVE_* variables override the defaults
    let config = DemuxConfig::from_env()?;
    println!("Demuxing {} with {:?}", input, config);

    let reader = BufReader::new(AsyncFile::open(&input).await?);
    let mut demuxer = TsStreamReader::new(reader, config);
    let mut writer = BufWriter::new(AsyncFile::create(&output).await?);

    let mut frames = 0usize;
    let mut video = 0usize;
    while let Some(event) = demuxer.next_event().await? {
        match event {
            DemuxEvent::ProgramsUpdated(association) => {
                for (pmt_pid, program) in association.iter() {
                    println!("program {} -> PMT PID {:#06x}", program, pmt_pid);
                }
            }
            DemuxEvent::StreamsUpdated {
                program_number,
                streams,
                ..
            } => {
                for stream in streams {
                    println!(
                        "program {}: PID {:#06x} stream_type {:#04x} ({:?})",
                        program_number,
                        stream.elementary_pid,
                        stream.stream_type,
                        stream.kind()
                    );
                }
            }
            DemuxEvent::VideoPacket(_) | DemuxEvent::VideoPes(_) => video += 1,
            DemuxEvent::AudioFrame { pid, frame } => {
                if frames % 100 == 0 {
                    println!("PID {:#06x} {:.3}s {}", pid, frame.timestamp, frame.header);
                }
                writer.write_all(&frame.data).await?;
                frames += 1;
            }
        }
    }
    writer.flush().await?;

    println!(
        "\n{} ADTS frames written to {}, {} video records seen",
        frames, output, video
    );
    Ok(())
}
