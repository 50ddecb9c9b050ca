#![no_std]
#![no_main]

use bsp::entry;
use defmt::*;
use defmt_rtt as _;
use panic_probe as _;

// Provide an alias for our BSP so we can switch targets quickly.
use rp_pico as bsp;

use bsp::hal::{
    clocks::{init_clocks_and_plls, Clock},
    fugit::RateExtU32,
    gpio::{FunctionSpi, FunctionUart, PinState},
    pac,
    spi::Spi,
    uart::{DataBits, StopBits, UartConfig, UartPeripheral},
    watchdog::Watchdog,
    Sio, Timer,
};
use ntc_tempsens::channel::CHANNEL_COUNT;
use ntc_tempsens::config::{ServiceConfig, BAUD_RATE};
use ntc_tempsens::mcp3008::Mcp3008;
use ntc_tempsens::TempSensService;

const SPI_FREQ_HZ: u32 = 1_000_000;

#[entry]
fn main() -> ! {
    info!("NTC TempSens Starting");
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        bsp::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The single-cycle I/O block controls our GPIO pins
    let sio = Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = bsp::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Set up UART0 for the host link, 9600 8N1
    let uart_pins = (
        pins.gpio0.into_function::<FunctionUart>(),
        pins.gpio1.into_function::<FunctionUart>(),
    );
    let uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(BAUD_RATE.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();

    // Set up SPI0 for the MCP3008
    let spi_miso = pins.gpio16.into_function::<FunctionSpi>();
    let spi_sclk = pins.gpio18.into_function::<FunctionSpi>();
    let spi_mosi = pins.gpio19.into_function::<FunctionSpi>();
    let spi = Spi::<_, _, _, 8>::new(pac.SPI0, (spi_mosi, spi_miso, spi_sclk)).init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        SPI_FREQ_HZ.Hz(),
        embedded_hal::spi::MODE_0,
    );
    let adc_cs = pins.gpio17.into_push_pull_output_in_state(PinState::High);
    let adc = Mcp3008::new(spi, adc_cs).unwrap();

    let mut service = TempSensService::with_config(uart, adc, timer, ServiceConfig::DEFAULT);

    info!(
        "Serving {} thermistor channels at {} baud",
        CHANNEL_COUNT, BAUD_RATE
    );
    service.dispatch_loop()
}
