mod machine {
    use std::{
        fs,
        path::PathBuf,
        process,
        thread,
        time::{
            Duration,
            Instant,
        },
    };

    use d5700::{
        display::Headless,
        keyboard::ScriptedKeyboard,
        Emulator,
    };

    pub fn emulator(program: &[u16]) -> (Emulator, Headless) {
        emulator_with_keys(program, &[])
    }

    pub fn emulator_with_keys(program: &[u16], keys: &[u8]) -> (Emulator, Headless) {
        let headless = Headless::default();
        let mut emulator = Emulator::new(headless.clone(), ScriptedKeyboard::new(keys));
        emulator.load_bytes(&image(program)).unwrap();
        (emulator, headless)
    }

    /// r1 = 1, then loop forever on r0 += r1
    pub fn counter_program() -> Vec<u16> {
        vec![0x0101, 0x1010, 0x5002]
    }

    pub fn image(program: &[u16]) -> Vec<u8> {
        program.iter().flat_map(|word| word.to_be_bytes()).collect()
    }

    pub fn wait_for_halt(emulator: &Emulator) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while emulator.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        !emulator.is_running()
    }

    pub fn rom_file(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("d5700-{}-{name}.rom", process::id()));
        fs::write(&path, bytes).unwrap();
        path
    }
}

#[cfg(test)]
mod test {
    use std::{
        fs,
        thread,
        time::Duration,
    };

    use d5700::{
        Bank,
        RomError,
    };

    use crate::machine::{
        counter_program,
        emulator,
        emulator_with_keys,
        rom_file,
        wait_for_halt,
    };

    #[test]
    fn store_store_add_halt() {
        let (mut emulator, _) = emulator(&[0x000A, 0x0105, 0x1012, 0x0000]);
        emulator.run().unwrap();
        assert!(wait_for_halt(&emulator));

        let cpu = emulator.cpu();
        assert_eq!(cpu.register(0), Ok(10));
        assert_eq!(cpu.register(1), Ok(5));
        assert_eq!(cpu.register(2), Ok(15));
        assert_eq!(cpu.program_counter(), 6);
        assert!(!emulator.timer().is_running());
    }

    #[test]
    fn restart_runs_from_zero_again() {
        let (mut emulator, _) = emulator(&[0x0101, 0x1010, 0x0000]);
        emulator.run().unwrap();
        assert!(wait_for_halt(&emulator));
        assert_eq!(emulator.cpu().register(0), Ok(1));

        emulator.run().unwrap();
        assert!(wait_for_halt(&emulator));
        assert_eq!(emulator.cpu().register(0), Ok(2));
        assert_eq!(emulator.cpu().program_counter(), 4);
    }

    #[test]
    fn stop_cancels_a_looping_program() {
        let (mut emulator, _) = emulator(&counter_program());
        emulator.run().unwrap();
        thread::sleep(Duration::from_millis(30));
        assert!(emulator.is_running());

        emulator.stop();
        assert!(!emulator.is_running());
        assert!(!emulator.timer().is_running());

        thread::sleep(Duration::from_millis(10));
        let settled = emulator.cpu().register(0).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(emulator.cpu().register(0), Ok(settled));
    }

    #[test]
    fn repeated_start_keeps_one_schedule() {
        let (mut emulator, _) = emulator(&counter_program());
        emulator.run().unwrap();
        emulator.run().unwrap();
        emulator.run().unwrap();
        thread::sleep(Duration::from_millis(10));

        emulator.cpu_mut().set_register(0, 0).unwrap();
        thread::sleep(Duration::from_millis(200));
        emulator.stop();

        // One loop iteration is two steps, so a single 500Hz clock manages ~50 in 200ms.
        let count = emulator.cpu().register(0).unwrap();
        assert!(count <= 75, "{count} iterations in 200ms");
        assert!(count > 0);
    }

    #[test]
    fn fault_under_clock_stops_machine_and_timer() {
        // SET_TIMER 10, then JUMP to an odd address
        let (mut emulator, _) = emulator(&[0xB0A0, 0x5001]);
        emulator.run().unwrap();
        assert!(wait_for_halt(&emulator));

        assert_eq!(emulator.cpu().program_counter(), 2);
        assert_eq!(emulator.cpu().timer(), 10);
        assert!(!emulator.timer().is_running());
        assert!(emulator.timer().get() <= 10);
    }

    #[test]
    fn timer_counts_down_alongside_cpu() {
        // SET_TIMER 0xFF, then spin on JUMP 2
        let (mut emulator, _) = emulator(&[0xBFF0, 0x5002]);
        emulator.run().unwrap();
        thread::sleep(Duration::from_millis(200));
        let remaining = emulator.timer().get();
        emulator.stop();

        assert!(remaining < 0xFF);
        assert!(remaining > 0);
    }

    #[test]
    fn draws_characters() {
        let (mut emulator, headless) = emulator(&[
            0x0048, // r0 = 'H'
            0xF000, // draw r0 at row 0, col 0
            0x0049, // r0 = 'I'
            0xF001, // draw r0 at row 0, col 1
            0x0000,
        ]);
        emulator.run().unwrap();
        assert!(wait_for_halt(&emulator));

        let screen = emulator.screen().lock().unwrap();
        assert_eq!(screen.cell(0, 0), Some('H'));
        assert_eq!(screen.cell(1, 0), Some('I'));
        assert_eq!(headless.frames(), 2);
    }

    #[test]
    fn keyboard_digit_to_screen() {
        let (mut emulator, _) = emulator_with_keys(
            &[
                0x6000, // r0 = key
                0xE010, // r1 = ascii(r0)
                0xF144, // draw r1 at row 4, col 4
                0x0000,
            ],
            &[0x7],
        );
        emulator.run().unwrap();
        assert!(wait_for_halt(&emulator));

        assert_eq!(emulator.screen().lock().unwrap().cell(4, 4), Some('7'));
    }

    #[test]
    fn machines_are_independent() {
        let (mut first, _) = emulator(&[0x0011, 0x0000]);
        let (mut second, _) = emulator(&[0x0022, 0x0000]);
        first.run().unwrap();
        second.run().unwrap();
        assert!(wait_for_halt(&first));
        assert!(wait_for_halt(&second));

        assert_eq!(first.cpu().register(0), Ok(0x11));
        assert_eq!(second.cpu().register(0), Ok(0x22));
    }

    #[test]
    fn load_program_from_file() {
        let path = rom_file("hello", &[0x00, 0x48, 0x01, 0x45, 0x02, 0x4C]);
        let (mut emulator, _) = emulator(&[0xFFFF; 8]);
        emulator.load_program(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let memory = emulator.memory().lock().unwrap();
        let bytes: Vec<u8> = (0usize..8).map(|a| memory.read(a, Bank::Rom).unwrap()).collect();
        assert_eq!(bytes, vec![0x00, 0x48, 0x01, 0x45, 0x02, 0x4C, 0x00, 0x00]);
    }

    #[test]
    fn load_program_size_limits() {
        let (mut emulator, _) = emulator(&[]);

        let fits = rom_file("fits", &[0x01; 4095]);
        assert!(emulator.load_program(&fits).is_ok());
        fs::remove_file(&fits).unwrap();

        let too_big = rom_file("too-big", &[0x01; 4097]);
        assert!(matches!(
            emulator.load_program(&too_big),
            Err(RomError::ImageTooLarge {
                rom_size: 4097,
                capacity: 4096
            })
        ));
        fs::remove_file(&too_big).unwrap();
    }

    #[test]
    fn load_program_missing_file() {
        let (mut emulator, _) = emulator(&[]);
        let err = emulator.load_program("/no/such/dir/program.rom").unwrap_err();

        assert!(matches!(err, RomError::FileNotFound(_)));
        assert!(err.to_string().contains("not found"));
    }
}
